//! Remote exchange with the processing service
//!
//! One utterance yields exactly one request: JSON for speech and typed
//! input, multipart for uploaded audio. No retries, no idempotency keys.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::message::{AudioFile, ServerReply, Utterance, UtteranceContent};
use crate::{Error, Result};

/// Multipart field carrying the uploaded audio
pub const AUDIO_FIELD: &str = "audio_file";

/// Fallback reason for failed text exchanges without a body message
const TEXT_FAILURE_FALLBACK: &str = "A system error occurred.";

/// Fallback reason for failed uploads without a body message
const UPLOAD_FAILURE_FALLBACK: &str = "Failed to process audio file.";

/// Performs the request/response cycle of a turn
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Send an utterance and wait for the reply
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exchange`] on a non-success status, or a transport
    /// error if the service cannot be reached
    async fn process(&self, utterance: &Utterance) -> Result<ServerReply>;

    /// Ask the service to forget the conversation context
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent
    async fn clear_context(&self) -> Result<()>;
}

/// JSON body of a text exchange
#[derive(Debug, Serialize)]
struct ProcessRequest<'a> {
    transcript: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

/// Fields a failure body may carry
#[derive(Debug, Default, Deserialize)]
struct FailureBody {
    error: Option<String>,
    response: Option<String>,
}

/// Extract the failure reason from a non-success body
///
/// Prefers `error`, then `response`, then `fallback` (or a status message
/// when the body is not JSON at all).
#[must_use]
pub fn failure_reason(status: u16, body: &str, fallback: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<FailureBody>(body) else {
        return format!("server returned status {status}");
    };

    let nonblank = |r: &String| !r.trim().is_empty();
    parsed
        .error
        .filter(nonblank)
        .or_else(|| parsed.response.filter(nonblank))
        .unwrap_or_else(|| fallback.to_string())
}

/// HTTP client for the processing service
#[derive(Debug, Clone)]
pub struct HttpExchange {
    client: reqwest::Client,
    base_url: String,
    process_path: String,
    upload_path: String,
    clear_path: String,
}

impl HttpExchange {
    /// Create a client for the configured service
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            process_path: config.process_path.clone(),
            upload_path: config.upload_path.clone(),
            clear_path: config.clear_path.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a text utterance as JSON
    async fn send_text(&self, text: &str, language: Option<&str>) -> Result<ServerReply> {
        tracing::debug!(chars = text.len(), language, "sending transcript");

        let response = self
            .client
            .post(self.url(&self.process_path))
            .json(&ProcessRequest {
                transcript: text,
                language,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "process request failed");
                e
            })?;

        Self::read_reply(response, TEXT_FAILURE_FALLBACK).await
    }

    /// Send an audio file as multipart form data
    async fn send_audio(&self, file: &AudioFile, language: Option<&str>) -> Result<ServerReply> {
        tracing::debug!(
            file = %file.name,
            audio_bytes = file.bytes.len(),
            "uploading audio file"
        );

        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| Error::Config(format!("invalid audio mime type: {e}")))?;

        let mut form = reqwest::multipart::Form::new().part(AUDIO_FIELD, part);
        if let Some(language) = language {
            form = form.text("language", language.to_string());
        }

        let response = self
            .client
            .post(self.url(&self.upload_path))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "upload request failed");
                e
            })?;

        Self::read_reply(response, UPLOAD_FAILURE_FALLBACK).await
    }

    async fn read_reply(response: reqwest::Response, fallback: &str) -> Result<ServerReply> {
        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = failure_reason(status.as_u16(), &body, fallback);
            tracing::warn!(status = %status, reason = %reason, "processing service error");
            return Err(Error::Exchange {
                status: status.as_u16(),
                reason,
            });
        }

        let reply: ServerReply = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse reply");
            e
        })?;

        tracing::info!(lang = ?reply.lang, chars = reply.response.len(), "reply received");
        Ok(reply)
    }
}

#[async_trait]
impl Exchange for HttpExchange {
    async fn process(&self, utterance: &Utterance) -> Result<ServerReply> {
        let language = utterance.language.as_deref();
        match &utterance.content {
            UtteranceContent::Text(text) => self.send_text(text, language).await,
            UtteranceContent::Audio(file) => self.send_audio(file, language).await,
        }
    }

    async fn clear_context(&self) -> Result<()> {
        let response = self.client.post(self.url(&self.clear_path)).send().await?;
        tracing::debug!(status = %response.status(), "context clear acknowledged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins() {
        let body = r#"{"error":"bad input","response":"ignored"}"#;
        assert_eq!(failure_reason(400, body, "fallback"), "bad input");
    }

    #[test]
    fn response_field_is_second_choice() {
        let body = r#"{"response":"No audio file detected.","lang":"en-US"}"#;
        assert_eq!(failure_reason(400, body, "fallback"), "No audio file detected.");
    }

    #[test]
    fn blank_error_defers_to_response() {
        let body = r#"{"error":"  ","response":"real reason"}"#;
        assert_eq!(failure_reason(500, body, "fallback"), "real reason");
    }

    #[test]
    fn empty_json_uses_fallback() {
        assert_eq!(failure_reason(500, "{}", "fallback"), "fallback");
        assert_eq!(failure_reason(500, r#"{"error":"  "}"#, "fallback"), "fallback");
    }

    #[test]
    fn non_json_uses_status_message() {
        assert_eq!(
            failure_reason(502, "<html>Bad Gateway</html>", "fallback"),
            "server returned status 502"
        );
    }

    #[test]
    fn request_omits_unset_language() {
        let body = serde_json::to_value(ProcessRequest {
            transcript: "hello",
            language: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"transcript": "hello"}));
    }
}
