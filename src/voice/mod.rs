//! Voice host seams
//!
//! Speech recognition and synthesis are provided by the host (browser,
//! desktop shell, terminal). The controller talks to them through the
//! traits defined here and keeps its own snapshot of the voice catalog.

mod catalog;
mod recognition;
mod synthesis;

pub use catalog::{Voice, VoiceCatalog, VoicePolicy};
pub use recognition::{RecognitionEvent, RecognitionSettings, SpeechRecognizer};
pub use synthesis::{SpeakRequest, SpeechSynthesizer};
