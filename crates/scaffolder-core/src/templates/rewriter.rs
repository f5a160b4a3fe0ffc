//! Literal placeholder substitution in the materialized project

use crate::error::{ScaffoldError, ScaffoldResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Replace every occurrence of `find` with `replace` in one file.
///
/// `file` is relative to the project root. Rules are not idempotent: applying
/// one twice to the same content is unsafe when `replace` contains `find`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRule {
    pub file: PathBuf,
    pub find: String,
    pub replace: String,
}

impl PlaceholderRule {
    /// Rewrite `content`, or `None` if the literal does not occur
    pub fn apply(&self, content: &str) -> Option<String> {
        if !content.contains(&self.find) {
            return None;
        }
        Some(content.replace(&self.find, &self.replace))
    }

    /// True if `content` still carries the generic literal outside the replacement values.
    ///
    /// The replacement may itself contain the literal (e.g. `mybot` + `_identity`
    /// contains `bot_identity`), so those spans are masked before searching.
    pub fn is_unresolved_in(&self, content: &str) -> bool {
        if self.replace.is_empty() {
            return content.contains(&self.find);
        }
        content
            .split(self.replace.as_str())
            .any(|segment| segment.contains(&self.find))
    }
}

/// Apply each rule exactly once, in order, then verify no generic literal remains.
///
/// Returns the files that were rewritten.
pub fn apply_rules(project_root: &Path, rules: &[PlaceholderRule]) -> ScaffoldResult<Vec<PathBuf>> {
    let mut rewritten = Vec::new();

    for rule in rules {
        let path = project_root.join(&rule.file);
        let content = read(&path)?;

        let updated = rule
            .apply(&content)
            .ok_or_else(|| ScaffoldError::PlaceholderNotFound {
                file: rule.file.clone(),
                literal: rule.find.clone(),
            })?;

        std::fs::write(&path, updated).map_err(|e| ScaffoldError::MaterializationFailed {
            path: path.clone(),
            reason: format!("failed to write rewritten file: {}", e),
        })?;

        debug!(file = %rule.file.display(), find = %rule.find, replace = %rule.replace, "placeholder rewritten");
        if !rewritten.contains(&rule.file) {
            rewritten.push(rule.file.clone());
        }
    }

    verify_rules(project_root, rules)?;
    Ok(rewritten)
}

/// Postcondition: no rule's generic literal survives in its target file
pub fn verify_rules(project_root: &Path, rules: &[PlaceholderRule]) -> ScaffoldResult<()> {
    for rule in rules {
        let content = read(&project_root.join(&rule.file))?;
        if rule.is_unresolved_in(&content) {
            return Err(ScaffoldError::MaterializationFailed {
                path: project_root.join(&rule.file),
                reason: format!("placeholder '{}' still present after rewriting", rule.find),
            });
        }
    }
    Ok(())
}

fn read(path: &Path) -> ScaffoldResult<String> {
    std::fs::read_to_string(path).map_err(|e| ScaffoldError::MaterializationFailed {
        path: path.to_path_buf(),
        reason: format!("failed to read file for rewriting: {}", e),
    })
}
