//! Product configuration trait for CLI binaries
//!
//! The core library knows how to fetch, select, rewrite, and orchestrate; a
//! product binary tells it which template repository to use and what each
//! variant looks like.

use crate::request::Variant;
use crate::templates::manifest::{ExcludeRules, SharedFile};
use crate::variant::VariantDescriptor;
use std::path::Path;

/// Configuration trait for a scaffolding product
///
/// Each product implements this trait to define:
/// - Product identity (name, display name)
/// - Template source defaults and their environment overrides
/// - Per-variant descriptors
/// - Files shared by every variant and files never shipped
/// - Documentation links and post-setup instructions
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for the staging prefix and user agent)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// Default template repository (git remote or `.zip` archive URL)
    fn default_template_url(&self) -> &'static str;

    /// Default git revision of the template repository
    fn default_template_revision(&self) -> &'static str {
        "main"
    }

    /// Environment variable name for overriding the template URL
    fn template_url_env(&self) -> &'static str;

    /// Environment variable name for overriding the template revision
    fn template_revision_env(&self) -> &'static str;

    /// Descriptor for one variant
    fn variant(&self, variant: Variant) -> VariantDescriptor;

    /// Label shown for a variant in the selection prompt
    fn variant_label(&self, variant: Variant) -> &'static str;

    /// Files from the template root that ship with every project
    fn shared_files(&self) -> Vec<SharedFile>;

    /// Path components dropped wherever they appear in the copied tree
    fn exclude_rules(&self) -> ExcludeRules;

    /// URL for product documentation
    fn docs_url(&self) -> &'static str;

    /// Generate the "next steps" instructions after project creation
    fn next_steps(&self, dir: &Path, variant: Variant) -> Vec<String>;

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Upgrade/install command shown in version warnings
    fn upgrade_command(&self) -> &'static str;

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}
