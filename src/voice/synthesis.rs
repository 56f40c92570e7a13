//! Text-to-speech seam

use super::Voice;
use crate::Result;

/// A request to speak text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakRequest {
    /// Text to speak
    pub text: String,

    /// Language tag of the text
    pub lang: String,

    /// Voice to use; `None` lets the host pick its default
    pub voice: Option<Voice>,
}

/// A host speech synthesis capability
pub trait SpeechSynthesizer: Send {
    /// Voices currently available from the host (may be empty on first load)
    fn voices(&self) -> Vec<Voice>;

    /// Whether the host may still report voices later
    ///
    /// While this is true an empty catalog defers playback until
    /// [`crate::TurnController::on_voices_changed`]. A host with a fixed
    /// list returns false so an empty list speaks with the default voice.
    fn voices_pending(&self) -> bool {
        true
    }

    /// Stop anything speaking and drop anything queued
    fn cancel(&mut self);

    /// Start speaking
    ///
    /// # Errors
    ///
    /// Returns error if the host fails to start playback
    fn speak(&mut self, request: SpeakRequest) -> Result<()>;
}
