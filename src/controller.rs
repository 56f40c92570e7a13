//! Turn controller
//!
//! Drives one turn at a time through input -> exchange -> playback -> reset.
//!
//! ```text
//!            toggle                  result
//!   Idle ───────────▶ Listening ───────────────┐
//!    ▲  ▲               │ end / error           ▼
//!    │  └───────────────┘               Exchanging ──failure──▶ Idle
//!    │                                         │ success
//!    │  playback finished                      ▼
//!    └──────────────────────────────────── Playing
//! ```
//!
//! Typed and uploaded utterances enter at `Exchanging` directly. New
//! utterances are accepted from `Idle` and `Playing` (cancelling playback)
//! and rejected with [`Error::Busy`] otherwise.

use crate::config::{Config, LanguageConfig, PipelineConfig};
use crate::exchange::Exchange;
use crate::input::{FileInput, TextField};
use crate::message::{ServerReply, Role, Transcript, Utterance, UtteranceSource};
use crate::pipeline::{PipelineIndicator, PipelineSnapshot, Stage, StageStatus};
use crate::voice::{
    RecognitionEvent, RecognitionSettings, SpeakRequest, SpeechRecognizer, SpeechSynthesizer,
    Voice, VoiceCatalog, VoicePolicy,
};
use crate::{Error, Result};

const STATUS_READY: &str = "System ready.";
const STATUS_AWAITING_SPEECH: &str = "Awaiting transmission...";
const STATUS_SPEECH_TIMEOUT: &str = "Transmission timed out. System standby.";
const STATUS_ANALYZING: &str = "Analyzing transmission...";
const STATUS_UPLOADING: &str = "Uploading and processing audio file...";
const STATUS_REPLY_READY: &str = "System ready. Awaiting directive.";
const STATUS_EXCHANGE_FAILED: &str = "Anomaly Detected";
const STATUS_UPLOAD_FAILED: &str = "File processing failed.";
const STATUS_CLEARED: &str = "Dialogue log cleared. Context reset.";
const STATUS_VOICE_UNSUPPORTED: &str = "Voice recognition not supported by this host.";

/// Where the controller is in the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Nothing in flight
    Idle,
    /// A recognition session is capturing speech
    Listening,
    /// Waiting on the processing service
    Exchanging,
    /// Speaking (or about to speak) the reply
    Playing,
}

impl TurnState {
    /// Whether a new utterance may start from this state
    #[must_use]
    pub const fn can_acquire(self) -> bool {
        matches!(self, Self::Idle | Self::Playing)
    }

    /// Lowercase name for messages and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Exchanging => "exchanging",
            Self::Playing => "playing",
        }
    }
}

/// How a turn that reached the processing service ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The service replied; the reply was rendered and handed to playback
    Replied(ServerReply),
    /// The exchange failed; the reason was surfaced in the transcript
    Failed(String),
}

/// A reply waiting for the host to report its voices
#[derive(Debug, Clone)]
struct PendingPlayback {
    text: String,
    lang: String,
}

/// Owns all client-side session state and the host seams
pub struct TurnController {
    exchange: Box<dyn Exchange>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    catalog: VoiceCatalog,
    policy: VoicePolicy,
    pending_playback: Option<PendingPlayback>,
    transcript: Transcript,
    pipeline: PipelineIndicator,
    state: TurnState,
    language: String,
    languages: LanguageConfig,
    timing: PipelineConfig,
    status: String,
}

impl std::fmt::Debug for TurnController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnController")
            .field("state", &self.state)
            .field("language", &self.language)
            .field("voice_available", &self.recognizer.is_some())
            .field("messages", &self.transcript.len())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl TurnController {
    /// Create a controller without speech recognition
    ///
    /// # Errors
    ///
    /// Returns error if the voice keyword policy cannot be built
    pub fn new(
        config: &Config,
        exchange: Box<dyn Exchange>,
        synthesizer: Box<dyn SpeechSynthesizer>,
    ) -> Result<Self> {
        let policy = VoicePolicy::new(&config.playback.quality_keywords)?;
        let catalog = VoiceCatalog::new(synthesizer.voices());

        tracing::debug!(
            language = %config.language.default,
            voices = catalog.voices().len(),
            "turn controller initialized"
        );

        Ok(Self {
            exchange,
            recognizer: None,
            synthesizer,
            catalog,
            policy,
            pending_playback: None,
            transcript: Transcript::new(),
            pipeline: PipelineIndicator::new(),
            state: TurnState::Idle,
            language: config.language.default.clone(),
            languages: config.language.clone(),
            timing: config.pipeline,
            status: STATUS_VOICE_UNSUPPORTED.to_string(),
        })
    }

    /// Attach the host's speech recognizer
    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self.status = STATUS_READY.to_string();
        self
    }

    // -- Accessors ------------------------------------------------------------

    /// Current turn state
    #[must_use]
    pub const fn state(&self) -> TurnState {
        self.state
    }

    /// Conversation transcript
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Current pipeline indicator state
    #[must_use]
    pub fn pipeline(&self) -> PipelineSnapshot {
        self.pipeline.snapshot()
    }

    /// Shared handle to the pipeline indicator, for hosts that render it
    #[must_use]
    pub fn pipeline_handle(&self) -> PipelineIndicator {
        self.pipeline.clone()
    }

    /// Latest status line
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Selected language tag
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Whether the voice trigger is usable
    #[must_use]
    pub const fn voice_available(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Voice catalog snapshot
    #[must_use]
    pub const fn voice_catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    /// Whether a reply is waiting for voices to become available
    #[must_use]
    pub const fn has_pending_playback(&self) -> bool {
        self.pending_playback.is_some()
    }

    // -- Language -------------------------------------------------------------

    /// Select the language used for recognition, requests, and playback fallback
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the tag is not in the supported list
    pub fn set_language(&mut self, tag: &str) -> Result<()> {
        let Some(canonical) = self
            .languages
            .supported
            .iter()
            .find(|s| s.eq_ignore_ascii_case(tag.trim()))
        else {
            return Err(Error::Config(format!("unsupported language: {tag}")));
        };

        self.language.clone_from(canonical);
        tracing::info!(language = %self.language, "language selected");
        Ok(())
    }

    // -- Speech path ----------------------------------------------------------

    /// Voice trigger: start a session if none is active, stop it otherwise
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] if the host has no recognizer,
    /// [`Error::Busy`] while an exchange is in flight, or the host's error
    /// if the session cannot start
    pub fn toggle_listening(&mut self) -> Result<()> {
        let Some(recognizer) = self.recognizer.as_mut() else {
            self.status = STATUS_VOICE_UNSUPPORTED.to_string();
            return Err(Error::Unsupported(
                "speech recognition is not available".to_string(),
            ));
        };

        if self.state == TurnState::Listening {
            tracing::debug!("stopping recognition session");
            recognizer.stop();
            return Ok(());
        }

        if !self.state.can_acquire() {
            return Err(Error::Busy(self.state.as_str()));
        }

        self.synthesizer.cancel();
        self.pending_playback = None;

        let settings = RecognitionSettings::single_shot(self.language.clone());
        if let Err(e) = recognizer.start(&settings) {
            tracing::warn!(error = %e, "failed to start recognition session");
            self.status = format!("Error: {e}");
            self.state = TurnState::Idle;
            self.pipeline.reset();
            return Err(e);
        }

        tracing::debug!(language = %settings.language, "recognition session started");
        self.state = TurnState::Listening;
        Ok(())
    }

    /// Handle an event from the recognition session
    ///
    /// Returns the turn outcome when a final result was sent to the service.
    /// Events arriving outside a session are ignored.
    pub async fn on_recognition(&mut self, event: RecognitionEvent) -> Option<TurnOutcome> {
        if self.state != TurnState::Listening {
            tracing::debug!(?event, state = self.state.as_str(), "ignoring stale recognition event");
            return None;
        }

        match event {
            RecognitionEvent::Started => {
                self.status = STATUS_AWAITING_SPEECH.to_string();
                self.pipeline
                    .update(Stage::Input, StageStatus::Active, "RECEIVING VOICE");
                None
            }
            RecognitionEvent::Result(text) => {
                let text = text.trim();
                if text.is_empty() {
                    tracing::debug!("empty recognition result, waiting for session end");
                    return None;
                }
                let text = text.to_string();

                if let Some(recognizer) = self.recognizer.as_mut() {
                    recognizer.stop();
                }

                self.transcript.push(Role::User, text.clone());
                self.pipeline
                    .update(Stage::Input, StageStatus::Completed, "VOICE RECEIVED");

                let utterance =
                    Utterance::text(text, UtteranceSource::Speech, Some(self.language.clone()));
                Some(self.run_exchange(utterance).await)
            }
            RecognitionEvent::Error(code) => {
                tracing::warn!(code = %code, "speech recognition error");
                self.status = format!("Error: {code}. Please check mic permissions.");
                self.pipeline.reset();
                self.state = TurnState::Idle;
                None
            }
            RecognitionEvent::End => {
                tracing::debug!("recognition session ended without a result");
                self.status = STATUS_SPEECH_TIMEOUT.to_string();
                self.pipeline.reset();
                self.state = TurnState::Idle;
                None
            }
        }
    }

    // -- Typed path -----------------------------------------------------------

    /// Submit the text field
    ///
    /// Empty or whitespace-only input is ignored and returns `Ok(None)`.
    /// Otherwise the field is cleared before the request is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if a turn is listening or exchanging; the
    /// field is left untouched
    pub async fn submit_text(&mut self, field: &mut TextField) -> Result<Option<TurnOutcome>> {
        if field.value().trim().is_empty() {
            return Ok(None);
        }
        if !self.state.can_acquire() {
            return Err(Error::Busy(self.state.as_str()));
        }
        let Some(text) = field.take_submission() else {
            return Ok(None);
        };

        self.cancel_playback();
        self.pipeline
            .update(Stage::Input, StageStatus::Active, "TEXT INPUT");
        self.transcript.push(Role::User, text.clone());

        let utterance = Utterance::text(text, UtteranceSource::Typed, Some(self.language.clone()));
        Ok(Some(self.run_exchange(utterance).await))
    }

    // -- Upload path ----------------------------------------------------------

    /// Upload the file selected in `input`
    ///
    /// The input's value is reset in every case so picking the same file
    /// again fires a new change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if a turn is listening or exchanging
    pub async fn upload_selected(&mut self, input: &mut FileInput) -> Result<Option<TurnOutcome>> {
        let file = input.take();

        if !self.state.can_acquire() {
            return Err(Error::Busy(self.state.as_str()));
        }
        let Some(file) = file else {
            return Ok(None);
        };

        self.cancel_playback();
        self.transcript
            .push(Role::User, format!("[Transcribing audio file: {}]", file.name));
        self.status = STATUS_UPLOADING.to_string();
        self.pipeline
            .update(Stage::Input, StageStatus::Active, "UPLOADING FILE");

        let utterance = Utterance::audio(file, Some(self.language.clone()));
        Ok(Some(self.run_exchange(utterance).await))
    }

    // -- Exchange -------------------------------------------------------------

    async fn run_exchange(&mut self, utterance: Utterance) -> TurnOutcome {
        self.state = TurnState::Exchanging;

        let upload = utterance.source == UtteranceSource::UploadedAudio;
        let input_label = match utterance.source {
            UtteranceSource::Speech => "VOICE RECEIVED",
            UtteranceSource::Typed => "TEXT RECEIVED",
            UtteranceSource::UploadedAudio => "UPLOAD COMPLETE",
        };
        if !upload {
            self.status = STATUS_ANALYZING.to_string();
        }
        self.pipeline
            .update(Stage::Input, StageStatus::Completed, input_label);
        self.pipeline
            .update(Stage::Detect, StageStatus::Active, "ANALYZING...");

        tracing::info!(
            turn_id = %utterance.id,
            source = ?utterance.source,
            language = ?utterance.language,
            "sending utterance"
        );

        match self.exchange.process(&utterance).await {
            Ok(reply) => {
                tracing::info!(turn_id = %utterance.id, "turn replied");
                self.pipeline
                    .update(Stage::Detect, StageStatus::Completed, "LANGUAGE DETECTED");
                self.pipeline
                    .update(Stage::Core, StageStatus::Active, "CORE PROCESSING");
                self.pipeline
                    .update(Stage::Core, StageStatus::Completed, "PROCESSING COMPLETE");
                self.render_reply(&reply);
                TurnOutcome::Replied(reply)
            }
            Err(e) => {
                let reason = e.user_reason();
                tracing::warn!(turn_id = %utterance.id, error = %e, "turn failed");

                let (text, status) = if upload {
                    (format!("Error processing file: {reason}"), STATUS_UPLOAD_FAILED)
                } else {
                    (format!("Error: {reason}"), STATUS_EXCHANGE_FAILED)
                };
                self.transcript.push(Role::Error, text);
                self.status = status.to_string();
                self.pipeline.schedule_reset(self.timing.error_reset_delay);
                self.state = TurnState::Idle;
                TurnOutcome::Failed(reason)
            }
        }
    }

    // -- Playback -------------------------------------------------------------

    fn render_reply(&mut self, reply: &ServerReply) {
        self.pipeline
            .update(Stage::Response, StageStatus::Active, "GENERATING AUDIO");
        self.transcript.push(Role::Assistant, reply.response.clone());

        let lang = reply
            .lang
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map_or_else(|| self.language.clone(), ToString::to_string);

        self.state = TurnState::Playing;
        self.speak(reply.response.clone(), lang);

        self.pipeline
            .update(Stage::Response, StageStatus::Completed, "TRANSMISSION ENDS");
        self.status = STATUS_REPLY_READY.to_string();
        self.pipeline.schedule_reset(self.timing.reset_delay);
    }

    /// Speak now, or park the request until the host reports voices
    ///
    /// A host whose voice list is final speaks right away, with its default
    /// voice when the list is empty.
    fn speak(&mut self, text: String, lang: String) {
        self.synthesizer.cancel();

        if self.catalog.is_empty() {
            self.catalog.refresh(self.synthesizer.voices());
        }

        if self.catalog.is_empty() && self.synthesizer.voices_pending() {
            tracing::debug!(lang = %lang, "voice catalog empty, deferring playback");
            self.pending_playback = Some(PendingPlayback { text, lang });
            return;
        }

        self.speak_now(text, lang);
    }

    fn speak_now(&mut self, text: String, lang: String) {
        let voice = self.catalog.select(&lang, &self.policy).cloned();
        tracing::debug!(
            lang = %lang,
            voice = voice.as_ref().map_or("host default", |v| v.name.as_str()),
            "speaking reply"
        );

        let request = SpeakRequest { text, lang, voice };
        if let Err(e) = self.synthesizer.speak(request) {
            tracing::warn!(error = %e, "speech playback failed");
            self.transcript
                .push(Role::Error, format!("Speech playback failed: {e}"));
            if self.state == TurnState::Playing {
                self.state = TurnState::Idle;
            }
        }
    }

    fn cancel_playback(&mut self) {
        self.synthesizer.cancel();
        self.pending_playback = None;
    }

    /// The host's voice list changed
    ///
    /// Refreshes the catalog and speaks a parked reply, once.
    pub fn on_voices_changed(&mut self, voices: Vec<Voice>) {
        self.catalog.refresh(voices);

        if self.catalog.is_empty() {
            return;
        }

        if let Some(pending) = self.pending_playback.take() {
            tracing::debug!("voices available, resuming deferred playback");
            self.synthesizer.cancel();
            self.speak_now(pending.text, pending.lang);
        }
    }

    /// The host finished (or abandoned) speaking
    pub fn on_playback_finished(&mut self) {
        if self.state == TurnState::Playing && self.pending_playback.is_none() {
            self.state = TurnState::Idle;
        }
    }

    // -- Clear ----------------------------------------------------------------

    /// Empty the transcript, reset the indicator, and ask the service to
    /// forget the conversation
    ///
    /// An active listening session is stopped. A failed context reset on the
    /// service is logged and ignored.
    pub async fn clear(&mut self) {
        self.transcript.clear();
        self.pipeline.reset();
        self.cancel_playback();
        match self.state {
            TurnState::Listening => {
                if let Some(recognizer) = self.recognizer.as_mut() {
                    tracing::debug!("stopping recognition session on clear");
                    recognizer.stop();
                }
                self.state = TurnState::Idle;
            }
            TurnState::Playing => self.state = TurnState::Idle,
            TurnState::Idle | TurnState::Exchanging => {}
        }
        self.status = STATUS_CLEARED.to_string();

        if let Err(e) = self.exchange.clear_context().await {
            tracing::warn!(error = %e, "failed to clear server context");
        }
    }
}
