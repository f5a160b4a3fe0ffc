//! Scaffolder Core - Shared library for variant project scaffolding CLIs
//!
//! This library turns a multi-variant template repository plus a small
//! parameter set (project name, variant) into a self-consistent project
//! directory, then runs the variant's setup or deploy steps inside it.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Core Operations** - Validation, template fetching, subtree
//!   materialization, placeholder rewriting, manifest synthesis, process running
//! - **Layer 2: Workflow Orchestration** - `ProductConfig` trait, variant
//!   descriptors and the `Scaffolder` pipeline with its rollback policy
//! - **Layer 3: CLI/TUI Interface** - Optional cliclack-based prompts (feature-gated)
//!
//! # Feature Flags
//!
//! - `tui` (default): Enables the cliclack-based TUI prompts module
//!
//! # Example Usage (without TUI)
//!
//! ```ignore
//! use scaffolder_core::{ProductConfig, Scaffolder, ScaffoldOptions, SystemRunner, Variant};
//! use scaffolder_core::templates::{TemplateFetcher, TemplateSource};
//!
//! let source = TemplateSource::from_config(&MyConfig, None, None)?;
//! let fetcher = TemplateFetcher::new(source, MyConfig.user_agent());
//! let scaffolder = Scaffolder::new(MyConfig, fetcher, Box::new(SystemRunner), ScaffoldOptions::default());
//! let outcome = scaffolder
//!     .run(Variant::Offchain, "mybot", &std::env::current_dir()?, &mut TracingReporter)
//!     .await?;
//! ```

pub mod error;
pub mod pipeline;
pub mod product;
pub mod progress;
pub mod request;
pub mod runtime;
pub mod templates;
pub mod variant;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use error::{ErrorCategory, ScaffoldError, ScaffoldResult};
pub use pipeline::{RollbackPolicy, ScaffoldOptions, ScaffoldOutcome, Scaffolder};
pub use product::ProductConfig;
pub use progress::{NoopReporter, ProgressReporter, Stage, StageStatus, TracingReporter};
pub use request::{validate_name, ScaffoldRequest, Variant};
pub use runtime::{ProcessResult, ProcessRunner, ScriptedRunner, SystemRunner};
pub use templates::{TemplateFetcher, TemplateSource};
pub use variant::{RuleSpec, VariantDescriptor};

#[cfg(feature = "tui")]
pub use tui::run;

/// CLI version - used for template compatibility checking
/// Each binary should define its own version, but this provides a fallback
pub const DEFAULT_CLI_VERSION: &str = "0.1.0";
