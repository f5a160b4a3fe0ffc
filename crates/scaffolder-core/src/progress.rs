//! Stage-by-stage progress reporting
//!
//! Stages never touch shared UI state. They receive a `&mut dyn
//! ProgressReporter` and emit `(stage, status)` events; the caller decides how
//! to render them (spinner, log lines, nothing).

use crate::runtime::orchestrator::StepKind;
use std::fmt;

/// A pipeline stage, as seen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Fetch,
    Materialize,
    Rewrite,
    Manifest,
    ToolCheck,
    Step(StepKind),
    Rollback,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validate => write!(f, "Validating parameters"),
            Stage::Fetch => write!(f, "Fetching template"),
            Stage::Materialize => write!(f, "Creating project files"),
            Stage::Rewrite => write!(f, "Renaming project identifiers"),
            Stage::Manifest => write!(f, "Writing deployment manifest"),
            Stage::ToolCheck => write!(f, "Checking tools"),
            Stage::Step(step) => write!(f, "{}", step.description()),
            Stage::Rollback => write!(f, "Removing partial project"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Started,
    Succeeded(String),
    Skipped(String),
    Warning(String),
    Failed(String),
}

pub trait ProgressReporter {
    fn report(&mut self, stage: Stage, status: StageStatus);
}

/// Discards every event
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&mut self, _stage: Stage, _status: StageStatus) {}
}

/// Forwards events to `tracing`, for non-interactive runs
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&mut self, stage: Stage, status: StageStatus) {
        match status {
            StageStatus::Started => tracing::info!(%stage, "started"),
            StageStatus::Succeeded(msg) => tracing::info!(%stage, "{}", msg),
            StageStatus::Skipped(msg) => tracing::info!(%stage, "skipped: {}", msg),
            StageStatus::Warning(msg) => tracing::warn!(%stage, "{}", msg),
            StageStatus::Failed(msg) => tracing::error!(%stage, "{}", msg),
        }
    }
}

/// Keeps every event in order; used by tests to assert which stages ran
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: Vec<(Stage, StageStatus)>,
}

impl RecordingReporter {
    pub fn stages_started(&self) -> Vec<Stage> {
        self.events
            .iter()
            .filter(|(_, status)| *status == StageStatus::Started)
            .map(|(stage, _)| *stage)
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&mut self, stage: Stage, status: StageStatus) {
        self.events.push((stage, status));
    }
}
