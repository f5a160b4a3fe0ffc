//! Deployment manifest synthesis (`dfx.json`)
//!
//! The manifest is always built from typed fields and written in one atomic
//! step. Whatever manifest the template shipped is replaced, never patched.

use crate::error::{ScaffoldError, ScaffoldResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Fixed defaults for a variant's manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSettings {
    pub file_name: &'static str,
    pub toolchain_version: &'static str,
    pub canister_type: &'static str,
    pub gzip: bool,
    pub network_name: &'static str,
    pub bind: &'static str,
    pub network_type: &'static str,
    pub subnet_type: &'static str,
    pub schema_version: u32,
}

impl ManifestSettings {
    /// Local replica on 127.0.0.1:8080, gzipped Rust canister
    pub fn local_replica() -> Self {
        Self {
            file_name: "dfx.json",
            toolchain_version: "0.24.3",
            canister_type: "rust",
            gzip: true,
            network_name: "local",
            bind: "127.0.0.1:8080",
            network_type: "ephemeral",
            subnet_type: "system",
            schema_version: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    /// Toolchain version pin
    pub dfx: String,
    pub canisters: BTreeMap<String, CanisterEntry>,
    pub networks: BTreeMap<String, NetworkEntry>,
    /// Manifest schema version
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanisterEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub package: String,
    /// Interface descriptor path, relative to the project root
    pub candid: String,
    pub gzip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub bind: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub replica: ReplicaEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaEntry {
    pub subnet_type: String,
}

impl DeploymentManifest {
    pub fn synthesize(project_name: &str, candid_path: &str, settings: &ManifestSettings) -> Self {
        let mut canisters = BTreeMap::new();
        canisters.insert(
            project_name.to_string(),
            CanisterEntry {
                kind: settings.canister_type.to_string(),
                package: project_name.to_string(),
                candid: candid_path.to_string(),
                gzip: settings.gzip,
            },
        );

        let mut networks = BTreeMap::new();
        networks.insert(
            settings.network_name.to_string(),
            NetworkEntry {
                bind: settings.bind.to_string(),
                kind: settings.network_type.to_string(),
                replica: ReplicaEntry {
                    subnet_type: settings.subnet_type.to_string(),
                },
            },
        );

        Self {
            dfx: settings.toolchain_version.to_string(),
            canisters,
            networks,
            version: settings.schema_version,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}

/// Find the interface descriptor shipped with the project.
///
/// Uses the single `*.did` file if there is exactly one, otherwise `<name>.did`.
pub fn discover_candid(project_root: &Path, project_name: &str) -> String {
    let found: Vec<String> = WalkDir::new(project_root)
        .into_iter()
        .filter_entry(|e| e.file_name() != "target" && e.file_name() != ".dfx")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "did"))
        .filter_map(|e| {
            e.path()
                .strip_prefix(project_root)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();

    match found.as_slice() {
        [single] => single.clone(),
        _ => format!("{}.did", project_name),
    }
}

/// Build the manifest and write it to the project root, replacing any existing one.
///
/// The content goes to a temp file in the same directory which is then renamed
/// over the destination, so a failure never leaves a half-written manifest.
pub fn write_manifest(
    project_root: &Path,
    project_name: &str,
    settings: &ManifestSettings,
) -> ScaffoldResult<(PathBuf, DeploymentManifest)> {
    let path = project_root.join(settings.file_name);
    let fail = |reason: String| ScaffoldError::ManifestWriteFailed {
        path: path.clone(),
        reason,
    };

    let candid = discover_candid(project_root, project_name);
    let manifest = DeploymentManifest::synthesize(project_name, &candid, settings);
    let json = manifest
        .to_json()
        .map_err(|e| fail(format!("serialization failed: {}", e)))?;

    let mut tmp = tempfile::NamedTempFile::new_in(project_root)
        .map_err(|e| fail(format!("failed to create temp file: {}", e)))?;
    tmp.write_all(json.as_bytes())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| fail(format!("failed to write: {}", e)))?;
    tmp.persist(&path)
        .map_err(|e| fail(format!("failed to replace manifest: {}", e.error)))?;

    debug!(path = %path.display(), candid = %candid, "deployment manifest written");
    Ok((path, manifest))
}
