//! Voice catalog and voice selection

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A synthesis voice exposed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Display name (e.g. "Google हिन्दी", "Microsoft Heera - English (India)")
    pub name: String,

    /// Language tag (e.g. "hi-IN")
    pub lang: String,

    /// Synthesized on-device rather than by a remote service
    #[serde(default)]
    pub local_service: bool,
}

impl Voice {
    /// Check whether this voice speaks `lang`
    ///
    /// Hosts disagree on separators ("en_US" vs "en-US") and case, so both
    /// are normalized before the exact comparison.
    #[must_use]
    pub fn speaks(&self, lang: &str) -> bool {
        normalize_tag(&self.lang) == normalize_tag(lang)
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().replace('_', "-").to_ascii_lowercase()
}

/// Voice preference heuristic
///
/// A best-effort name match; hosts name their voices however they like.
#[derive(Debug, Clone, Default)]
pub struct VoicePolicy {
    quality: Option<Regex>,
}

impl VoicePolicy {
    /// Build a policy from "high quality" name keywords
    ///
    /// # Errors
    ///
    /// Returns error if the keyword pattern cannot be compiled
    pub fn new(keywords: &[String]) -> Result<Self> {
        let alternatives: Vec<String> = keywords
            .iter()
            .map(|k| k.as_str().trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self::default());
        }

        let pattern = format!("(?i)({})", alternatives.join("|"));
        let quality = Regex::new(&pattern)
            .map_err(|e| Error::Config(format!("invalid voice keyword pattern: {e}")))?;

        Ok(Self {
            quality: Some(quality),
        })
    }

    /// Whether a voice name looks like a high quality voice
    #[must_use]
    pub fn is_high_quality(&self, name: &str) -> bool {
        self.quality.as_ref().is_some_and(|re| re.is_match(name))
    }
}

/// Snapshot of the host's synthesis voices
#[derive(Debug, Clone, Default)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    /// Create a catalog from a host snapshot
    #[must_use]
    pub const fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }

    /// Replace the snapshot
    pub fn refresh(&mut self, voices: Vec<Voice>) {
        tracing::debug!(count = voices.len(), "voice catalog refreshed");
        self.voices = voices;
    }

    /// Whether the host has reported any voices yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// All voices
    #[must_use]
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Pick a voice for `lang`
    ///
    /// In order: a high quality voice for the language, a remote voice for
    /// the language, any voice for the language. `None` means the host
    /// should use its default voice.
    #[must_use]
    pub fn select(&self, lang: &str, policy: &VoicePolicy) -> Option<&Voice> {
        let mut candidates = self.voices.iter().filter(|v| v.speaks(lang));

        let first = candidates.clone().next()?;

        if let Some(voice) = candidates
            .clone()
            .find(|v| policy.is_high_quality(&v.name))
        {
            return Some(voice);
        }

        if let Some(voice) = candidates.find(|v| !v.local_service) {
            return Some(voice);
        }

        Some(first)
    }
}
