//! Configuration management for Beacon chat

pub mod file;

use std::time::Duration;

use crate::voice::Voice;
use crate::{Error, Result};

use file::ChatConfigFile;

/// Default processing service URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Default recognition / request language
const DEFAULT_LANGUAGE: &str = "en-IN";

/// Languages offered when the config file lists none
const DEFAULT_SUPPORTED_LANGUAGES: &[&str] = &["en-IN", "hi-IN", "mr-IN", "en-US"];

/// Voice name keywords treated as high quality
const DEFAULT_QUALITY_KEYWORDS: &[&str] = &[
    "google",
    "microsoft",
    "apple",
    "natural",
    "neural",
    "premium",
    "enhanced",
];

/// Beacon chat configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Processing service configuration
    pub server: ServerConfig,

    /// Language selection
    pub language: LanguageConfig,

    /// Spoken playback configuration
    pub playback: PlaybackConfig,

    /// Pipeline indicator timing
    pub pipeline: PipelineConfig,
}

/// Processing service configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL, without trailing slash
    pub url: String,

    /// Text endpoint path
    pub process_path: String,

    /// Audio upload endpoint path
    pub upload_path: String,

    /// Context reset endpoint path
    pub clear_path: String,

    /// Request timeout; `None` leaves the HTTP stack's own bound in place
    pub timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            process_path: "/process_query".to_string(),
            upload_path: "/upload_audio".to_string(),
            clear_path: "/clear_context".to_string(),
            timeout: None,
        }
    }
}

/// Language configuration
#[derive(Debug, Clone)]
pub struct LanguageConfig {
    /// Language selected at startup
    pub default: String,

    /// Language tags the user may select
    pub supported: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_LANGUAGE.to_string(),
            supported: DEFAULT_SUPPORTED_LANGUAGES
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl LanguageConfig {
    /// Check whether a tag is selectable
    #[must_use]
    pub fn is_supported(&self, tag: &str) -> bool {
        self.supported.iter().any(|s| s.eq_ignore_ascii_case(tag))
    }
}

/// Spoken playback configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Voice name keywords that mark a high quality voice
    pub quality_keywords: Vec<String>,

    /// Voices offered by the terminal synthesizer
    pub voices: Vec<Voice>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            quality_keywords: DEFAULT_QUALITY_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            voices: Vec::new(),
        }
    }
}

/// Pipeline indicator timing
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Delay before reset after a completed turn
    pub reset_delay: Duration,

    /// Delay before reset after a failed turn
    pub error_reset_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reset_delay: Duration::from_millis(4000),
            error_reset_delay: Duration::from_millis(1000),
        }
    }
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if the resulting configuration is invalid
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with environment overrides
    ///
    /// `env` looks up a variable by name; it is injected so callers can
    /// resolve against something other than the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if the server URL is empty or the default language is
    /// not in the supported list
    pub fn resolve(fc: ChatConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        // Server config (env > toml > default)
        let url = server_url(
            &env("BEACON_CHAT_SERVER_URL")
                .or(fc.server.url)
                .unwrap_or(defaults.server.url),
        )?;

        let server = ServerConfig {
            url,
            process_path: normalize_path(
                &env("BEACON_CHAT_PROCESS_PATH")
                    .or(fc.server.process_path)
                    .unwrap_or(defaults.server.process_path),
            ),
            upload_path: normalize_path(
                &fc.server.upload_path.unwrap_or(defaults.server.upload_path),
            ),
            clear_path: normalize_path(
                &env("BEACON_CHAT_CLEAR_PATH")
                    .or(fc.server.clear_path)
                    .unwrap_or(defaults.server.clear_path),
            ),
            timeout: fc.server.timeout_secs.map(Duration::from_secs),
        };

        // Language config (env > toml > default)
        let supported = fc
            .language
            .supported
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.language.supported);
        let language = LanguageConfig {
            default: env("BEACON_CHAT_LANGUAGE")
                .or(fc.language.default)
                .unwrap_or(defaults.language.default),
            supported,
        };
        if !language.is_supported(&language.default) {
            return Err(Error::Config(format!(
                "default language '{}' is not in the supported list",
                language.default
            )));
        }

        let playback = PlaybackConfig {
            quality_keywords: fc
                .playback
                .quality_keywords
                .unwrap_or(defaults.playback.quality_keywords),
            voices: fc
                .playback
                .voices
                .into_iter()
                .map(|v| Voice {
                    name: v.name,
                    lang: v.lang,
                    local_service: v.local_service,
                })
                .collect(),
        };

        let pipeline = PipelineConfig {
            reset_delay: fc
                .pipeline
                .reset_delay_ms
                .map_or(defaults.pipeline.reset_delay, Duration::from_millis),
            error_reset_delay: fc
                .pipeline
                .error_reset_delay_ms
                .map_or(defaults.pipeline.error_reset_delay, Duration::from_millis),
        };

        Ok(Self {
            server,
            language,
            playback,
            pipeline,
        })
    }
}

/// Trim a server base URL and drop trailing slashes
///
/// # Errors
///
/// Returns [`Error::Config`] if nothing is left
pub fn server_url(raw: &str) -> Result<String> {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        return Err(Error::Config("server url must not be empty".to_string()));
    }
    Ok(url.to_string())
}

/// Ensure an endpoint path starts with a single `/`
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
