//! Turn data: utterances, server replies, and the transcript

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// Where an utterance came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtteranceSource {
    /// Recognized speech
    Speech,
    /// Typed into the input field
    Typed,
    /// An uploaded audio file
    UploadedAudio,
}

/// An audio file picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    /// File name shown to the user and sent to the service
    pub name: String,

    /// Raw file contents
    pub bytes: Vec<u8>,

    /// MIME type sent with the multipart part
    pub mime_type: String,
}

impl AudioFile {
    /// Create an audio file from in-memory contents
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_for_name(&name).to_string();
        Self {
            name,
            bytes,
            mime_type,
        }
    }

    /// Read an audio file from disk
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub async fn read(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| "audio".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(name, bytes))
    }
}

/// Guess the MIME type of an audio file from its extension
#[must_use]
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "webm" => "audio/webm",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

/// Utterance payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceContent {
    /// Recognized or typed text
    Text(String),
    /// Audio to be transcribed by the service
    Audio(AudioFile),
}

/// One user-originated input unit for a single turn
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Turn identifier, used for log correlation
    pub id: Uuid,

    /// Payload
    pub content: UtteranceContent,

    /// Source of the utterance
    pub source: UtteranceSource,

    /// Language tag selected when the utterance was captured
    pub language: Option<String>,
}

impl Utterance {
    /// Create a text utterance (speech or typed)
    #[must_use]
    pub fn text(text: impl Into<String>, source: UtteranceSource, language: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: UtteranceContent::Text(text.into()),
            source,
            language,
        }
    }

    /// Create an uploaded-audio utterance
    #[must_use]
    pub fn audio(file: AudioFile, language: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: UtteranceContent::Audio(file),
            source: UtteranceSource::UploadedAudio,
            language,
        }
    }
}

/// Successful reply from the processing service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerReply {
    /// Reply text
    pub response: String,

    /// Language tag of the reply, used to pick a voice
    #[serde(default)]
    pub lang: Option<String>,
}

/// Who a transcript message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    /// System-facing failure surfaced to the user
    Error,
}

impl Role {
    /// Short label for rendering
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Error => "error",
        }
    }
}

/// A transcript entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Ordered, append-only conversation log
///
/// Entries are never edited or removed individually; `clear` empties it.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create an empty transcript
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Append a message and return a reference to it
    pub fn push(&mut self, role: Role, text: impl Into<String>) -> &Message {
        self.messages.push(Message {
            role,
            text: text.into(),
            at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// All messages in append order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages appended at or after `index`
    #[must_use]
    pub fn since(&self, index: usize) -> &[Message] {
        self.messages.get(index..).unwrap_or_default()
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Remove every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
