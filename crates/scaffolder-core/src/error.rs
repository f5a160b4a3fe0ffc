//! Error taxonomy for a scaffolding run
//!
//! Every stage of the pipeline fails with a [`ScaffoldError`]. The variant
//! tells the caller which stage failed, [`ScaffoldError::category`] groups
//! them for display, and [`ScaffoldError::exit_code`] decides the status the
//! process terminates with.

use crate::runtime::process::ProcessResult;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type ScaffoldResult<T> = Result<T, ScaffoldError>;

#[derive(Debug, Error)]
pub enum ScaffoldError {
    // Input errors: reported before anything touches the filesystem
    #[error("Invalid project name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Directory \"{}\" already exists", path.display())]
    TargetExists { path: PathBuf },

    // Acquisition errors: the staging area is discarded
    #[error("Failed to fetch template from {source_desc}: {reason}")]
    FetchFailed { source_desc: String, reason: String },

    // Transform errors: the target directory may be partially populated
    #[error("Failed to materialize project at {}: {reason}", path.display())]
    MaterializationFailed { path: PathBuf, reason: String },

    #[error("Placeholder '{literal}' not found in {}", file.display())]
    PlaceholderNotFound { file: PathBuf, literal: String },

    #[error("Failed to write deployment manifest {}: {reason}", path.display())]
    ManifestWriteFailed { path: PathBuf, reason: String },

    // Process errors: the external step ran and exited non-zero
    #[error("Setup script failed ({0})")]
    SetupScriptFailed(ProcessFailure),

    #[error("Deploy script failed ({0})")]
    DeployScriptFailed(ProcessFailure),

    #[error("Build verification failed ({0})")]
    BuildVerificationFailed(ProcessFailure),

    #[error("Failed to start '{program}': {reason}")]
    Spawn { program: String, reason: String },

    // Interaction errors
    #[error("Terminal interaction failed: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("Setup cancelled.")]
    Cancelled,
}

/// Exit code and captured output of a failed external step
#[derive(Debug, Clone)]
pub struct ProcessFailure {
    pub command: String,
    pub result: ProcessResult,
}

impl ProcessFailure {
    pub fn new(command: impl Into<String>, result: ProcessResult) -> Self {
        Self {
            command: command.into(),
            result,
        }
    }

    /// Captured standard error, decoded lossily
    pub fn stderr(&self) -> String {
        self.result.stderr_lossy()
    }
}

impl fmt::Display for ProcessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` exited with code {}",
            self.command, self.result.exit_code
        )
    }
}

/// Coarse error grouping used for display and rollback decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Acquisition,
    Transform,
    Process,
    Interaction,
}

impl ScaffoldError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidName { .. } | Self::TargetExists { .. } => ErrorCategory::Input,
            Self::FetchFailed { .. } => ErrorCategory::Acquisition,
            Self::MaterializationFailed { .. }
            | Self::PlaceholderNotFound { .. }
            | Self::ManifestWriteFailed { .. } => ErrorCategory::Transform,
            Self::SetupScriptFailed(_)
            | Self::DeployScriptFailed(_)
            | Self::BuildVerificationFailed(_)
            | Self::Spawn { .. } => ErrorCategory::Process,
            Self::Prompt(_) | Self::Cancelled => ErrorCategory::Interaction,
        }
    }

    /// The failed external step, if this error came from one
    pub fn process_failure(&self) -> Option<&ProcessFailure> {
        match self {
            Self::SetupScriptFailed(f)
            | Self::DeployScriptFailed(f)
            | Self::BuildVerificationFailed(f) => Some(f),
            _ => None,
        }
    }

    /// Status the whole run terminates with.
    ///
    /// A failed script propagates its own exit code so the caller sees the
    /// same status the script reported.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::SetupScriptFailed(f)
            | Self::DeployScriptFailed(f)
            | Self::BuildVerificationFailed(f) => clamp_exit_code(f.result.exit_code),
            Self::Spawn { .. } => 127,
            Self::Cancelled => 130,
            _ => 1,
        }
    }
}

fn clamp_exit_code(code: i32) -> u8 {
    match u8::try_from(code) {
        Ok(0) | Err(_) => 1,
        Ok(code) => code,
    }
}
