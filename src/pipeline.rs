//! Pipeline indicator
//!
//! Cosmetic four-stage progress display (input, detect, core, response).
//! The controller updates it as a turn progresses; nothing reads it back to
//! make a decision, so it can never block or redirect a turn.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Utterance capture
    Input,
    /// Language detection / speech recognition on the service
    Detect,
    /// Core processing on the service
    Core,
    /// Reply rendering and playback
    Response,
}

impl Stage {
    /// All stages in display order
    pub const ALL: [Self; 4] = [Self::Input, Self::Detect, Self::Core, Self::Response];

    /// Stable identifier
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Detect => "detect",
            Self::Core => "core",
            Self::Response => "response",
        }
    }

    /// Label shown while the stage is idle
    #[must_use]
    pub const fn idle_label(self) -> &'static str {
        match self {
            Self::Input => "STANDBY",
            Self::Detect | Self::Core | Self::Response => "AWAITING",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Input => 0,
            Self::Detect => 1,
            Self::Core => 2,
            Self::Response => 3,
        }
    }
}

/// Status of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageStatus {
    #[default]
    Idle,
    Active,
    Completed,
}

/// Displayed state of one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageState {
    pub status: StageStatus,
    pub label: String,
}

impl StageState {
    fn idle(stage: Stage) -> Self {
        Self {
            status: StageStatus::Idle,
            label: stage.idle_label().to_string(),
        }
    }
}

/// Snapshot of all four stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSnapshot {
    stages: [StageState; 4],
}

impl PipelineSnapshot {
    fn idle() -> Self {
        Self {
            stages: Stage::ALL.map(StageState::idle),
        }
    }

    /// State of one stage
    #[must_use]
    pub const fn stage(&self, stage: Stage) -> &StageState {
        &self.stages[stage.index()]
    }

    /// Whether every stage is idle
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.stages.iter().all(|s| s.status == StageStatus::Idle)
    }

    /// Iterate stages in display order
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageState)> {
        Stage::ALL.into_iter().zip(self.stages.iter())
    }
}

#[derive(Debug)]
struct Inner {
    snapshot: PipelineSnapshot,
    /// Bumped on every mutation; a scheduled reset only fires if unchanged
    generation: u64,
}

/// Shared pipeline indicator
///
/// Cloning yields another handle to the same indicator.
#[derive(Debug, Clone)]
pub struct PipelineIndicator {
    inner: Arc<Mutex<Inner>>,
}

impl Default for PipelineIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineIndicator {
    /// Create an indicator with every stage idle
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                snapshot: PipelineSnapshot::idle(),
                generation: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set a stage's status and label
    pub fn update(&self, stage: Stage, status: StageStatus, label: &str) {
        let mut inner = self.lock();
        inner.snapshot.stages[stage.index()] = StageState {
            status,
            label: label.to_string(),
        };
        inner.generation += 1;
        tracing::trace!(stage = stage.id(), ?status, label, "pipeline stage updated");
    }

    /// Return every stage to idle
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.snapshot = PipelineSnapshot::idle();
        inner.generation += 1;
        tracing::trace!("pipeline reset");
    }

    /// Current state of all stages
    #[must_use]
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.lock().snapshot.clone()
    }

    /// Reset after `delay`, unless the indicator changes in the meantime
    ///
    /// Without a Tokio runtime the reset happens immediately.
    pub fn schedule_reset(&self, delay: Duration) {
        let scheduled_at = self.lock().generation;

        if tokio::runtime::Handle::try_current().is_err() {
            tracing::debug!("no runtime for delayed pipeline reset, resetting now");
            self.reset();
            return;
        }

        let indicator = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = indicator.lock();
            if inner.generation == scheduled_at {
                inner.snapshot = PipelineSnapshot::idle();
                inner.generation += 1;
                tracing::trace!("pipeline auto-reset");
            } else {
                tracing::trace!("pipeline changed since reset was scheduled, skipping");
            }
        });
    }
}
