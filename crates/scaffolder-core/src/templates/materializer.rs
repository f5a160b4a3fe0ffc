//! Copy one variant's subtree out of a staged template into the project root

use crate::error::{ScaffoldError, ScaffoldResult};
use crate::templates::manifest::{ExcludeRules, SharedFile};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// What to take from the template for one variant
#[derive(Debug, Clone, Default)]
pub struct MaterializePlan {
    /// Directory in the template whose contents become the project root
    pub subpath: String,
    /// Files from the template root that ship with the project
    pub shared_files: Vec<SharedFile>,
    /// Patterns dropped wherever they appear in the copied tree
    pub exclude: ExcludeRules,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    /// Project-relative paths of every file written
    pub files: Vec<String>,
    /// Shared files the template did not provide
    pub missing_shared: Vec<String>,
    /// Top-level template entries left behind (sibling variant, repo meta files)
    pub discarded: Vec<String>,
}

/// Create the empty project directory. Fails if anything already occupies the path.
pub fn create_target(target: &Path) -> ScaffoldResult<()> {
    std::fs::create_dir(target).map_err(|e| match e.kind() {
        ErrorKind::AlreadyExists => ScaffoldError::TargetExists {
            path: target.to_path_buf(),
        },
        _ => ScaffoldError::MaterializationFailed {
            path: target.to_path_buf(),
            reason: format!("failed to create project directory: {}", e),
        },
    })
}

/// Populate `target` (which must already exist) from the staged template.
///
/// The variant subtree is flattened into `target`; shared files are copied to
/// their destinations; nothing else from the template root is taken.
pub fn materialize(
    template_root: &Path,
    plan: &MaterializePlan,
    target: &Path,
) -> ScaffoldResult<MaterializeReport> {
    let subtree = template_root.join(&plan.subpath);
    if !subtree.is_dir() {
        return Err(ScaffoldError::MaterializationFailed {
            path: subtree,
            reason: format!("template has no '{}' directory", plan.subpath),
        });
    }

    let mut report = MaterializeReport {
        discarded: discarded_entries(template_root, plan)?,
        ..Default::default()
    };

    let walker = WalkDir::new(&subtree)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            relative(&subtree, entry.path())
                .map(|rel| !plan.exclude.excludes_path(&rel))
                .unwrap_or(false)
        });

    for entry in walker {
        let entry = entry.map_err(|e| copy_failed(&subtree, e.to_string()))?;
        let rel = relative(&subtree, entry.path())
            .ok_or_else(|| copy_failed(entry.path(), "path escapes template subtree".into()))?;
        let dest = target.join(&rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)
                .map_err(|e| copy_failed(&dest, format!("failed to create directory: {}", e)))?;
        } else {
            copy_file(entry.path(), &dest)?;
            debug!(file = %rel, "copied");
            report.files.push(rel);
        }
    }

    for shared in &plan.shared_files {
        let source = template_root.join(&shared.source);
        if !source.is_file() {
            warn!(file = %shared.source, "shared file not found in template");
            report.missing_shared.push(shared.source.clone());
            continue;
        }
        let dest_rel = shared.destination().to_string();
        copy_file(&source, &target.join(&dest_rel))?;
        if !report.files.contains(&dest_rel) {
            report.files.push(dest_rel);
        }
    }

    Ok(report)
}

fn discarded_entries(template_root: &Path, plan: &MaterializePlan) -> ScaffoldResult<Vec<String>> {
    let top_level_variant = plan.subpath.split('/').next().unwrap_or(plan.subpath.as_str());
    let entries = std::fs::read_dir(template_root)
        .map_err(|e| copy_failed(template_root, format!("failed to list template: {}", e)))?;

    let mut discarded: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name != top_level_variant)
        .filter(|name| !plan.shared_files.iter().any(|s| s.source == *name))
        .collect();
    discarded.sort();
    Ok(discarded)
}

fn copy_file(source: &Path, dest: &Path) -> ScaffoldResult<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| copy_failed(parent, format!("failed to create directory: {}", e)))?;
    }
    // fs::copy keeps permission bits, so template scripts stay executable
    std::fs::copy(source, dest)
        .map_err(|e| copy_failed(dest, format!("failed to copy {}: {}", source.display(), e)))?;
    Ok(())
}

fn relative(base: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(base).ok().map(|p| {
        p.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    })
}

fn copy_failed(path: &Path, reason: String) -> ScaffoldError {
    ScaffoldError::MaterializationFailed {
        path: PathBuf::from(path),
        reason,
    }
}
