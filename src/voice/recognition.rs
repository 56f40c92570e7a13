//! Speech-to-text session seam

use crate::Result;

/// Settings applied when a recognition session starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSettings {
    /// Recognition language tag (e.g. "en-IN")
    pub language: String,

    /// Keep listening after the first pause
    pub continuous: bool,

    /// Deliver partial results
    pub interim_results: bool,
}

impl RecognitionSettings {
    /// Single-shot settings: stop after the first final result
    #[must_use]
    pub fn single_shot(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            continuous: false,
            interim_results: false,
        }
    }
}

/// Events a recognition session reports back to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// The session is capturing audio
    Started,
    /// A final transcript
    Result(String),
    /// The session failed (host error code, e.g. "not-allowed", "no-speech")
    Error(String),
    /// The session ended, with or without a result
    End,
}

/// A host speech recognition capability
///
/// Implementations deliver [`RecognitionEvent`]s to
/// [`crate::TurnController::on_recognition`] in the order they occur.
pub trait SpeechRecognizer: Send {
    /// Start a session
    ///
    /// # Errors
    ///
    /// Returns error if the host refuses to start a session
    fn start(&mut self, settings: &RecognitionSettings) -> Result<()>;

    /// Stop the active session; the host still reports `End`
    fn stop(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_shot_is_not_continuous() {
        let settings = RecognitionSettings::single_shot("hi-IN");
        assert_eq!(settings.language, "hi-IN");
        assert!(!settings.continuous);
        assert!(!settings.interim_results);
    }
}
