//! Terminal host
//!
//! Line-oriented front end for the turn controller: typed input on stdin,
//! replies and pipeline state on stdout. The terminal has no speech
//! recognizer; "speaking" prints the reply with the voice that would be used.

use std::io::Write;
use std::path::PathBuf;

use crate::Result;
use crate::message::{Message, Role};
use crate::pipeline::{PipelineSnapshot, StageStatus};
use crate::voice::{SpeakRequest, SpeechSynthesizer, Voice};

/// A parsed REPL line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Plain text to submit
    Say(String),
    /// Upload an audio file
    Upload(PathBuf),
    /// Select a language
    Language(String),
    /// Toggle the voice trigger
    Voice,
    /// Clear the conversation
    Clear,
    /// Show status and pipeline
    Status,
    /// Show help
    Help,
    /// Leave the REPL
    Quit,
    /// Blank line
    Empty,
    /// A slash command that was not understood
    Unknown(String),
}

/// Parse one line of REPL input
#[must_use]
pub fn parse_command(line: &str) -> ConsoleCommand {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleCommand::Empty;
    }

    let Some(rest) = line.strip_prefix('/') else {
        return ConsoleCommand::Say(line.to_string());
    };

    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(n, a)| (n, a.trim()));

    match (name.to_ascii_lowercase().as_str(), arg) {
        ("upload", path) if !path.is_empty() => ConsoleCommand::Upload(PathBuf::from(path)),
        ("lang" | "language", tag) if !tag.is_empty() => ConsoleCommand::Language(tag.to_string()),
        ("voice" | "mic", _) => ConsoleCommand::Voice,
        ("clear", _) => ConsoleCommand::Clear,
        ("status", _) => ConsoleCommand::Status,
        ("help" | "?", _) => ConsoleCommand::Help,
        ("quit" | "exit" | "q", _) => ConsoleCommand::Quit,
        _ => ConsoleCommand::Unknown(line.to_string()),
    }
}

/// REPL help text
pub const HELP: &str = "\
Type a message and press enter to send it.
  /upload <file>   send an audio file for transcription
  /lang <tag>      select a language (e.g. hi-IN)
  /voice           toggle voice input
  /clear           clear the conversation
  /status          show status and pipeline
  /quit            exit";

/// Render a transcript message for the terminal
#[must_use]
pub fn render_message(message: &Message) -> String {
    let prefix = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
        Role::Error => "!",
    };
    format!("[{}] {prefix}> {}", message.at.format("%H:%M:%S"), message.text)
}

/// Render the pipeline indicator on one line
#[must_use]
pub fn render_pipeline(snapshot: &PipelineSnapshot) -> String {
    snapshot
        .iter()
        .map(|(stage, state)| {
            let marker = match state.status {
                StageStatus::Idle => ' ',
                StageStatus::Active => '*',
                StageStatus::Completed => '+',
            };
            format!("[{marker}] {}: {}", stage.id(), state.label)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Synthesizer that prints replies instead of playing audio
#[derive(Debug, Default)]
pub struct ConsoleSynthesizer {
    voices: Vec<Voice>,
    speaking: bool,
}

impl ConsoleSynthesizer {
    /// Create a synthesizer offering `voices`
    #[must_use]
    pub const fn new(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            speaking: false,
        }
    }

    /// Whether a reply is being "spoken"
    #[must_use]
    pub const fn is_speaking(&self) -> bool {
        self.speaking
    }
}

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn voices_pending(&self) -> bool {
        false
    }

    fn cancel(&mut self) {
        if self.speaking {
            tracing::debug!("console playback cancelled");
        }
        self.speaking = false;
    }

    fn speak(&mut self, request: SpeakRequest) -> Result<()> {
        let voice = request
            .voice
            .as_ref()
            .map_or("default voice", |v| v.name.as_str());

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "  (speaking as {voice}, {})", request.lang)?;
        stdout.flush()?;

        self.speaking = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{PipelineIndicator, Stage};

    #[test]
    fn plain_text_is_said() {
        assert_eq!(
            parse_command("  what is an IPO? "),
            ConsoleCommand::Say("what is an IPO?".to_string())
        );
        assert_eq!(parse_command("   "), ConsoleCommand::Empty);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(
            parse_command("/upload ./clips/q 1.wav"),
            ConsoleCommand::Upload(PathBuf::from("./clips/q 1.wav"))
        );
        assert_eq!(
            parse_command("/LANG hi-IN"),
            ConsoleCommand::Language("hi-IN".to_string())
        );
        assert_eq!(parse_command("/clear"), ConsoleCommand::Clear);
        assert_eq!(parse_command("/voice"), ConsoleCommand::Voice);
        assert_eq!(parse_command("/q"), ConsoleCommand::Quit);
    }

    #[test]
    fn commands_missing_arguments_are_unknown() {
        assert_eq!(
            parse_command("/upload"),
            ConsoleCommand::Unknown("/upload".to_string())
        );
        assert_eq!(
            parse_command("/frobnicate now"),
            ConsoleCommand::Unknown("/frobnicate now".to_string())
        );
    }

    #[test]
    fn pipeline_rendering_marks_stage_status() {
        let pipeline = PipelineIndicator::new();
        pipeline.update(Stage::Input, StageStatus::Completed, "TEXT RECEIVED");
        pipeline.update(Stage::Detect, StageStatus::Active, "ANALYZING...");

        let line = render_pipeline(&pipeline.snapshot());
        assert!(line.starts_with("[+] input: TEXT RECEIVED"));
        assert!(line.contains("[*] detect: ANALYZING..."));
        assert!(line.contains("[ ] response: AWAITING"));
    }

    #[test]
    fn console_synthesizer_tracks_speaking() {
        let mut synth = ConsoleSynthesizer::new(Vec::new());
        synth
            .speak(SpeakRequest {
                text: "Hello".to_string(),
                lang: "en-US".to_string(),
                voice: None,
            })
            .unwrap();
        assert!(synth.is_speaking());
        synth.cancel();
        assert!(!synth.is_speaking());
    }
}
