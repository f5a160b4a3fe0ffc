//! Scaffold parameters and their validation

use crate::error::{ScaffoldError, ScaffoldResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The two mutually exclusive kinds of generated project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Runs on the developer's machine
    Offchain,
    /// Deploys to the Internet Computer
    Onchain,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Offchain, Variant::Onchain];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Offchain => "offchain",
            Variant::Onchain => "onchain",
        }
    }

    /// The other variant, whose files never ship with this one
    pub fn sibling(&self) -> Variant {
        match self {
            Variant::Offchain => Variant::Onchain,
            Variant::Onchain => Variant::Offchain,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "offchain" | "off" => Ok(Variant::Offchain),
            "onchain" | "on" => Ok(Variant::Onchain),
            other => Err(format!(
                "unknown variant '{}' (expected 'offchain' or 'onchain')",
                other
            )),
        }
    }
}

/// Validated input for one scaffolding run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldRequest {
    variant: Variant,
    project_name: String,
    target_path: PathBuf,
}

impl ScaffoldRequest {
    /// Validate the raw user input against `base_dir` (normally the current directory).
    ///
    /// Performs no filesystem mutation.
    pub fn new(variant: Variant, raw_name: &str, base_dir: &Path) -> ScaffoldResult<Self> {
        validate_name(raw_name)?;

        let target_path = base_dir.join(raw_name);
        if target_exists(&target_path) {
            return Err(ScaffoldError::TargetExists { path: target_path });
        }

        Ok(Self {
            variant,
            project_name: raw_name.to_string(),
            target_path,
        })
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }
}

/// Check a project name against `^[A-Za-z0-9_-]+$`
pub fn validate_name(name: &str) -> ScaffoldResult<()> {
    if name.is_empty() {
        return Err(ScaffoldError::InvalidName {
            name: name.to_string(),
            reason: "Bot name is required",
        });
    }
    if !name.chars().all(is_allowed_char) {
        return Err(ScaffoldError::InvalidName {
            name: name.to_string(),
            reason: "Bot name can only contain letters, numbers, underscores, and hyphens",
        });
    }
    Ok(())
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

// symlink_metadata so a dangling symlink still counts as occupied
fn target_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}
