//! TOML configuration file loading
//!
//! Supports `~/.config/omni/beacon-chat/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ChatConfigFile {
    /// Processing service configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Language selection
    #[serde(default)]
    pub language: LanguageFileConfig,

    /// Spoken playback configuration
    #[serde(default)]
    pub playback: PlaybackFileConfig,

    /// Pipeline indicator timing
    #[serde(default)]
    pub pipeline: PipelineFileConfig,
}

/// Processing service configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Base URL of the processing service (e.g. "http://127.0.0.1:5000")
    pub url: Option<String>,

    /// Path of the text endpoint ("/process_query" or "/process")
    pub process_path: Option<String>,

    /// Path of the audio upload endpoint
    pub upload_path: Option<String>,

    /// Path of the context reset endpoint ("/clear_context" or "/clear")
    pub clear_path: Option<String>,

    /// Optional request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Language configuration
#[derive(Debug, Default, Deserialize)]
pub struct LanguageFileConfig {
    /// Language tag selected at startup (e.g. "en-IN")
    pub default: Option<String>,

    /// Language tags the user may switch to
    pub supported: Option<Vec<String>>,
}

/// Spoken playback configuration
#[derive(Debug, Default, Deserialize)]
pub struct PlaybackFileConfig {
    /// Voice name keywords that mark a high quality voice
    pub quality_keywords: Option<Vec<String>>,

    /// Voices offered by the terminal synthesizer
    #[serde(default)]
    pub voices: Vec<VoiceFileEntry>,
}

/// A voice entry in the config file
#[derive(Debug, Deserialize)]
pub struct VoiceFileEntry {
    pub name: String,
    pub lang: String,
    #[serde(default)]
    pub local_service: bool,
}

/// Pipeline indicator timing
#[derive(Debug, Default, Deserialize)]
pub struct PipelineFileConfig {
    /// Delay before the indicator resets after a completed turn
    pub reset_delay_ms: Option<u64>,

    /// Delay before the indicator resets after a failed turn
    pub error_reset_delay_ms: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `ChatConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> ChatConfigFile {
    let Some(path) = config_file_path() else {
        return ChatConfigFile::default();
    };

    load_config_file_at(&path)
}

/// Load a TOML config file from an explicit path
///
/// Missing or malformed files fall back to defaults with a warning.
#[must_use]
pub fn load_config_file_at(path: &Path) -> ChatConfigFile {
    if !path.exists() {
        return ChatConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ChatConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ChatConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/omni/beacon-chat/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("omni")
            .join("beacon-chat")
            .join("config.toml")
    })
}
