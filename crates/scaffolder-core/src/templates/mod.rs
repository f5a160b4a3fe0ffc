//! Template acquisition and transformation
//!
//! This module provides:
//! - Fetching a template into a staging directory (git, zip archive, local dir)
//! - Selecting and flattening one variant's subtree into the project root
//! - Literal placeholder rewriting with a checked postcondition
//! - Deployment manifest synthesis
//! - Version compatibility checking

pub mod deploy;
pub mod fetcher;
pub mod manifest;
pub mod materializer;
pub mod rewriter;
pub mod version;

pub use deploy::{DeploymentManifest, ManifestSettings};
pub use fetcher::{StagedTemplate, TemplateFetcher, TemplateSource};
pub use manifest::{ExcludeRules, SharedFile, TemplateConfig};
pub use materializer::{materialize, MaterializePlan, MaterializeReport};
pub use rewriter::{apply_rules, PlaceholderRule};
pub use version::check_compatibility;
