//! Input controls for typed and uploaded utterances

use crate::message::AudioFile;

/// Free-text input field
#[derive(Debug, Default, Clone)]
pub struct TextField {
    value: String,
}

impl TextField {
    /// Create an empty field
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: String::new(),
        }
    }

    /// Replace the field content
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Current content
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Take the trimmed content if it is non-empty, clearing the field
    ///
    /// Whitespace-only content is left in place and yields `None`.
    pub fn take_submission(&mut self) -> Option<String> {
        let trimmed = self.value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let submission = trimmed.to_string();
        self.value.clear();
        Some(submission)
    }
}

/// File picker for audio uploads
///
/// Mirrors a host file input: picking the file that is already selected
/// does not fire a change. The controller resets the value after every use
/// so the same file can be picked again.
#[derive(Debug, Default, Clone)]
pub struct FileInput {
    value: Option<AudioFile>,
}

impl FileInput {
    /// Create an input with nothing selected
    #[must_use]
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Select a file; returns whether a change fired
    pub fn select(&mut self, file: AudioFile) -> bool {
        if self.value.as_ref() == Some(&file) {
            return false;
        }
        self.value = Some(file);
        true
    }

    /// Currently selected file
    #[must_use]
    pub const fn selected(&self) -> Option<&AudioFile> {
        self.value.as_ref()
    }

    /// Take the selection, resetting the input's value
    pub fn take(&mut self) -> Option<AudioFile> {
        self.value.take()
    }
}
