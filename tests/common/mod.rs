//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use beacon_chat::{
    Config, Error, Exchange, PipelineIndicator, PipelineSnapshot, RecognitionSettings, Result,
    ServerReply, SpeakRequest, SpeechRecognizer, SpeechSynthesizer, TurnController, Utterance,
    Voice,
};

/// Scripted exchange response
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(ServerReply),
    Fail { status: u16, reason: String },
}

/// What the fake exchange saw
#[derive(Debug, Default)]
pub struct ExchangeLog {
    pub utterances: Vec<Utterance>,
    /// Pipeline state at the moment each request went out
    pub sent_pipelines: Vec<PipelineSnapshot>,
    pub clears: usize,
}

/// Exchange that answers from a script
#[derive(Debug, Default)]
pub struct FakeExchange {
    script: Mutex<VecDeque<Scripted>>,
    log: Arc<Mutex<ExchangeLog>>,
    pipeline: Arc<Mutex<Option<PipelineIndicator>>>,
    clear_fails: bool,
}

impl FakeExchange {
    pub fn new(script: Vec<Scripted>) -> (Self, Arc<Mutex<ExchangeLog>>) {
        let log = Arc::new(Mutex::new(ExchangeLog::default()));
        let exchange = Self {
            script: Mutex::new(script.into()),
            log: Arc::clone(&log),
            pipeline: Arc::default(),
            clear_fails: false,
        };
        (exchange, log)
    }

    /// Slot for the controller's indicator, filled once the controller exists
    pub fn pipeline_slot(&self) -> Arc<Mutex<Option<PipelineIndicator>>> {
        Arc::clone(&self.pipeline)
    }

    pub fn failing_clear(mut self) -> Self {
        self.clear_fails = true;
        self
    }
}

#[async_trait]
impl Exchange for FakeExchange {
    async fn process(&self, utterance: &Utterance) -> Result<ServerReply> {
        let sent_pipeline = self
            .pipeline
            .lock()
            .unwrap()
            .as_ref()
            .map(PipelineIndicator::snapshot);
        {
            let mut log = self.log.lock().unwrap();
            log.utterances.push(utterance.clone());
            log.sent_pipelines.extend(sent_pipeline);
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(reply)) => Ok(reply),
            Some(Scripted::Fail { status, reason }) => Err(Error::Exchange { status, reason }),
            None => Err(Error::Exchange {
                status: 500,
                reason: "script exhausted".to_string(),
            }),
        }
    }

    async fn clear_context(&self) -> Result<()> {
        self.log.lock().unwrap().clears += 1;
        if self.clear_fails {
            return Err(Error::Config("service unreachable".to_string()));
        }
        Ok(())
    }
}

/// What the fake recognizer saw
#[derive(Debug, Default)]
pub struct RecognizerLog {
    pub starts: Vec<RecognitionSettings>,
    pub stops: usize,
}

/// Recognizer that records calls
#[derive(Debug, Default)]
pub struct FakeRecognizer {
    log: Arc<Mutex<RecognizerLog>>,
    refuse_start: bool,
}

impl FakeRecognizer {
    pub fn new() -> (Self, Arc<Mutex<RecognizerLog>>) {
        let log = Arc::new(Mutex::new(RecognizerLog::default()));
        let recognizer = Self {
            log: Arc::clone(&log),
            refuse_start: false,
        };
        (recognizer, log)
    }

    pub fn refusing(mut self) -> Self {
        self.refuse_start = true;
        self
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(&mut self, settings: &RecognitionSettings) -> Result<()> {
        if self.refuse_start {
            return Err(Error::Recognition("not-allowed".to_string()));
        }
        self.log.lock().unwrap().starts.push(settings.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.log.lock().unwrap().stops += 1;
    }
}

/// What the fake synthesizer saw
#[derive(Debug, Default)]
pub struct SynthLog {
    pub spoken: Vec<SpeakRequest>,
    pub cancels: usize,
}

/// Synthesizer that records calls
#[derive(Debug, Default)]
pub struct FakeSynthesizer {
    voices: Arc<Mutex<Vec<Voice>>>,
    log: Arc<Mutex<SynthLog>>,
    fail_speak: bool,
}

impl FakeSynthesizer {
    pub fn new(voices: Vec<Voice>) -> (Self, Arc<Mutex<SynthLog>>) {
        let log = Arc::new(Mutex::new(SynthLog::default()));
        let synth = Self {
            voices: Arc::new(Mutex::new(voices)),
            log: Arc::clone(&log),
            fail_speak: false,
        };
        (synth, log)
    }

    pub fn failing(mut self) -> Self {
        self.fail_speak = true;
        self
    }
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn voices(&self) -> Vec<Voice> {
        self.voices.lock().unwrap().clone()
    }

    fn cancel(&mut self) {
        self.log.lock().unwrap().cancels += 1;
    }

    fn speak(&mut self, request: SpeakRequest) -> Result<()> {
        if self.fail_speak {
            return Err(Error::Synthesis("audio device busy".to_string()));
        }
        self.log.lock().unwrap().spoken.push(request);
        Ok(())
    }
}

/// Build a voice entry
pub fn voice(name: &str, lang: &str, local_service: bool) -> Voice {
    Voice {
        name: name.to_string(),
        lang: lang.to_string(),
        local_service,
    }
}

/// A catalog covering the default languages
pub fn standard_voices() -> Vec<Voice> {
    vec![
        voice("Samantha", "en-US", true),
        voice("Google US English", "en-US", false),
        voice("Rishi", "en-IN", true),
        voice("Google हिन्दी", "hi-IN", false),
    ]
}

/// Config with short indicator delays
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.pipeline.reset_delay = Duration::from_millis(400);
    config.pipeline.error_reset_delay = Duration::from_millis(100);
    config
}

/// Reply helper
pub fn reply(text: &str, lang: &str) -> Scripted {
    Scripted::Reply(ServerReply {
        response: text.to_string(),
        lang: Some(lang.to_string()),
    })
}

/// Everything a controller test needs to observe
pub struct Harness {
    pub controller: TurnController,
    pub exchange: Arc<Mutex<ExchangeLog>>,
    pub synth: Arc<Mutex<SynthLog>>,
    pub recognizer: Option<Arc<Mutex<RecognizerLog>>>,
}

/// Controller with a recognizer, the standard voices, and a scripted exchange
pub fn harness(script: Vec<Scripted>) -> Harness {
    harness_with(script, standard_voices(), true)
}

/// Controller with explicit voices and optional recognizer
pub fn harness_with(script: Vec<Scripted>, voices: Vec<Voice>, with_recognizer: bool) -> Harness {
    let (exchange, exchange_log) = FakeExchange::new(script);
    let pipeline_slot = exchange.pipeline_slot();
    let (synth, synth_log) = FakeSynthesizer::new(voices);
    let mut controller =
        TurnController::new(&test_config(), Box::new(exchange), Box::new(synth)).unwrap();
    *pipeline_slot.lock().unwrap() = Some(controller.pipeline_handle());

    let recognizer = if with_recognizer {
        let (recognizer, log) = FakeRecognizer::new();
        controller = controller.with_recognizer(Box::new(recognizer));
        Some(log)
    } else {
        None
    };

    Harness {
        controller,
        exchange: exchange_log,
        synth: synth_log,
        recognizer,
    }
}
