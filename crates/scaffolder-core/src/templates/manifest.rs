//! Template selection rules and the optional root `template.yaml`

use serde::{Deserialize, Serialize};

/// Name of the optional config file at the template root
pub const TEMPLATE_CONFIG_FILE: &str = "template.yaml";

/// A file from the template root that ships with every generated project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedFile {
    /// Source path relative to the template root
    pub source: String,

    /// Destination path in the project (defaults to source if not specified)
    #[serde(default)]
    pub dest: Option<String>,
}

impl SharedFile {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: None,
        }
    }

    /// Get the destination path (falls back to source if dest not specified)
    pub fn destination(&self) -> &str {
        self.dest.as_deref().unwrap_or(&self.source)
    }
}

/// Root template config (`template.yaml`), all fields optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Semver version of the oldest CLI that understands this template
    #[serde(default)]
    pub min_cli_version: Option<String>,

    /// Extra files from the template root to copy into every project
    #[serde(default)]
    pub shared_files: Vec<SharedFile>,

    /// Extra exclusion patterns, same syntax as [`ExcludeRules`]
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl TemplateConfig {
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

/// Path patterns for files that never ship with a generated project
///
/// A pattern matches a single path component at any depth: `*.orig` is a
/// suffix match, `npm-*` a prefix match, anything else exact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeRules {
    pub patterns: Vec<String>,
}

impl ExcludeRules {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Merge extra patterns into this set
    pub fn merge(&mut self, extra: &[String]) {
        self.patterns.extend(extra.iter().cloned());
    }

    /// Check if a name matches any pattern in the list
    fn matches_any(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix('*') {
                name.ends_with(suffix)
            } else if let Some(prefix) = pattern.strip_suffix('*') {
                name.starts_with(prefix)
            } else {
                name == pattern
            }
        })
    }

    /// Is a path (relative, `/`-separated) excluded because one of its components matches?
    pub fn excludes_path(&self, relative_path: &str) -> bool {
        relative_path
            .split('/')
            .any(|component| self.matches_any(component))
    }
}
