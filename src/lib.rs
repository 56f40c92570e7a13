//! Beacon Chat - Voice and text chat client for AI assistants
//!
//! This library provides the client side of a turn-taking assistant:
//! - Input acquisition (speech session, typed text, uploaded audio)
//! - Remote exchange with a processing service
//! - Reply rendering and spoken playback
//! - A cosmetic four-stage pipeline indicator
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                       Host                           │
//! │   Recognizer  │  Synthesizer  │  Text / File input  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Turn Controller                      │
//! │   State  │  Transcript  │  Voice catalog  │ Pipeline │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Processing service                      │
//! │   /process_query  │  /upload_audio  │  /clear_context│
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod exchange;
pub mod input;
pub mod message;
pub mod pipeline;
pub mod voice;

pub use config::Config;
pub use controller::{TurnController, TurnOutcome, TurnState};
pub use error::{Error, Result};
pub use exchange::{Exchange, HttpExchange};
pub use input::{FileInput, TextField};
pub use message::{
    AudioFile, Message, Role, ServerReply, Transcript, Utterance, UtteranceContent,
    UtteranceSource,
};
pub use pipeline::{PipelineIndicator, PipelineSnapshot, Stage, StageState, StageStatus};
pub use voice::{
    RecognitionEvent, RecognitionSettings, SpeakRequest, SpeechRecognizer, SpeechSynthesizer,
    Voice, VoiceCatalog, VoicePolicy,
};
