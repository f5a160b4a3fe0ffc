//! Template acquisition into a staging directory
//!
//! Three sources are supported, all landing in the same place:
//! - Git: `git clone` + `git checkout <revision>` through the process runner
//! - Archive: a `.zip` downloaded over HTTPS (single top-level folder stripped)
//! - Local: a directory on disk, copied as-is (for template development)
//!
//! The staging directory lives next to the final project but is never the
//! project itself, so a failed fetch leaves nothing behind.

use super::manifest::{TemplateConfig, TEMPLATE_CONFIG_FILE};
use crate::error::{ScaffoldError, ScaffoldResult};
use crate::product::ProductConfig;
use crate::runtime::process::{Invocation, ProcessRunner};
use anyhow::{Context, Result};
use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};
use url::Url;
use walkdir::WalkDir;
use zip::ZipArchive;

/// Directory name of the template inside the staging area
const STAGED_DIR: &str = "template";

/// Template source - git remote, zip archive URL, or local directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Git { url: String, revision: String },
    Archive(Url),
    Local(PathBuf),
}

impl TemplateSource {
    /// Resolve the source: explicit values win, then environment, then product defaults
    pub fn from_config<C: ProductConfig>(
        config: &C,
        url: Option<String>,
        revision: Option<String>,
    ) -> ScaffoldResult<Self> {
        let url = url
            .or_else(|| std::env::var(config.template_url_env()).ok())
            .unwrap_or_else(|| config.default_template_url().to_string());
        let revision = revision
            .or_else(|| std::env::var(config.template_revision_env()).ok())
            .unwrap_or_else(|| config.default_template_revision().to_string());
        Self::from_url(&url, &revision)
    }

    /// A URL ending in `.zip` is an archive; anything else is a git remote
    pub fn from_url(url: &str, revision: &str) -> ScaffoldResult<Self> {
        if url.ends_with(".zip") {
            let parsed = Url::parse(url).map_err(|e| ScaffoldError::FetchFailed {
                source_desc: url.to_string(),
                reason: format!("invalid archive URL: {}", e),
            })?;
            return Ok(Self::Archive(parsed));
        }
        Ok(Self::Git {
            url: url.to_string(),
            revision: revision.to_string(),
        })
    }

    /// Create a local template source from a path
    pub fn local(path: PathBuf) -> Self {
        Self::Local(path)
    }

    pub fn is_git(&self) -> bool {
        matches!(self, Self::Git { .. })
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Git { url, revision } if revision.is_empty() => write!(f, "{}", url),
            Self::Git { url, revision } => write!(f, "{}@{}", url, revision),
            Self::Archive(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A fetched template. Dropping it deletes the staging directory.
#[derive(Debug)]
pub struct StagedTemplate {
    _staging: TempDir,
    root: PathBuf,
    config: TemplateConfig,
}

impl StagedTemplate {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Contents of the template's `template.yaml`, or defaults if it has none
    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }
}

/// Template fetcher - retrieves a template into a staging directory
pub struct TemplateFetcher {
    source: TemplateSource,
    client: reqwest::Client,
    staging_prefix: String,
}

impl TemplateFetcher {
    /// Create a new fetcher with a custom user agent
    pub fn new(source: TemplateSource, user_agent: &str) -> Self {
        Self {
            source,
            client: reqwest::Client::builder()
                .user_agent(user_agent)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            staging_prefix: format!(".{}-staging-", user_agent),
        }
    }

    /// Get the template source
    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Obtain the template into a fresh staging directory under `staging_parent`
    pub async fn fetch(
        &self,
        runner: &dyn ProcessRunner,
        staging_parent: &Path,
    ) -> ScaffoldResult<StagedTemplate> {
        info!(source = %self.source, "fetching template");
        self.fetch_inner(runner, staging_parent)
            .await
            .map_err(|e| ScaffoldError::FetchFailed {
                source_desc: self.source.to_string(),
                reason: format!("{:#}", e),
            })
    }

    async fn fetch_inner(
        &self,
        runner: &dyn ProcessRunner,
        staging_parent: &Path,
    ) -> Result<StagedTemplate> {
        let staging = tempfile::Builder::new()
            .prefix(&self.staging_prefix)
            .tempdir_in(staging_parent)
            .with_context(|| {
                format!(
                    "Failed to create staging directory in {}",
                    staging_parent.display()
                )
            })?;
        let root = staging.path().join(STAGED_DIR);

        match &self.source {
            TemplateSource::Git { url, revision } => {
                Self::clone_git(runner, url, revision, staging.path(), &root)?
            }
            TemplateSource::Archive(url) => {
                let bytes = self.download(url).await?;
                extract_archive(&bytes, &root)?;
            }
            TemplateSource::Local(path) => copy_dir(path, &root)?,
        }

        let config = read_template_config(&root)?;
        debug!(root = %root.display(), "template staged");

        Ok(StagedTemplate {
            _staging: staging,
            root,
            config,
        })
    }

    fn clone_git(
        runner: &dyn ProcessRunner,
        url: &str,
        revision: &str,
        staging: &Path,
        root: &Path,
    ) -> Result<()> {
        let dest = root.to_string_lossy().into_owned();
        let clone = Invocation::new("git", staging).args(["clone", "--quiet", url, dest.as_str()]);
        let result = runner.run(&clone)?;
        if !result.success() {
            anyhow::bail!(
                "git clone exited with code {}: {}",
                result.exit_code,
                result.stderr_lossy().trim()
            );
        }

        if !revision.is_empty() {
            let checkout =
                Invocation::new("git", root).args(["checkout", "--quiet", revision]);
            let result = runner.run(&checkout)?;
            if !result.success() {
                anyhow::bail!(
                    "git checkout {} exited with code {}: {}",
                    revision,
                    result.exit_code,
                    result.stderr_lossy().trim()
                );
            }
        }

        if !root.is_dir() {
            anyhow::bail!("git clone did not produce {}", root.display());
        }
        Ok(())
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to fetch template archive from {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch template archive from {}: HTTP {}",
                url,
                response.status()
            );
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Extract a zip into `dest`, stripping the single top-level folder archive
/// hosts wrap repositories in (e.g. `openchat-bots-main/`)
pub fn extract_archive(zip_bytes: &[u8], dest: &Path) -> Result<()> {
    let mut archive =
        ZipArchive::new(Cursor::new(zip_bytes)).context("Failed to read template archive")?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        let path = file
            .enclosed_name()
            .ok_or_else(|| anyhow::anyhow!("Unsafe path in archive: {}", file.name()))?;
        entries.push((i, path, file.is_dir()));
    }

    let prefix = common_top_level(entries.iter().map(|(_, p, _)| p.as_path()));

    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create {}", dest.display()))?;

    for (i, path, is_dir) in entries {
        let relative = match &prefix {
            Some(prefix) => path.strip_prefix(prefix).unwrap_or(path.as_path()).to_path_buf(),
            None => path,
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let out = dest.join(&relative);

        if is_dir {
            std::fs::create_dir_all(&out)
                .with_context(|| format!("Failed to create {}", out.display()))?;
            continue;
        }

        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut file = archive.by_index(i)?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        std::fs::write(&out, &contents)
            .with_context(|| format!("Failed to write {}", out.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                std::fs::set_permissions(&out, std::fs::Permissions::from_mode(mode & 0o777))?;
            }
        }
    }

    Ok(())
}

/// The first path component, if every entry shares it and at least one entry is nested
fn common_top_level<'a>(paths: impl Iterator<Item = &'a Path>) -> Option<PathBuf> {
    let mut common: Option<Component<'a>> = None;
    let mut nested = false;

    for path in paths {
        let mut components = path.components();
        let first = components.next()?;
        if components.next().is_some() {
            nested = true;
        }
        match common {
            None => common = Some(first),
            Some(c) if c == first => {}
            Some(_) => return None,
        }
    }

    if nested {
        common.map(|c| PathBuf::from(c.as_os_str()))
    } else {
        None
    }
}

fn copy_dir(source: &Path, dest: &Path) -> Result<()> {
    if !source.is_dir() {
        anyhow::bail!("Template directory not found: {}", source.display());
    }

    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source)?;
        let out = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&out)
                .with_context(|| format!("Failed to create {}", out.display()))?;
        } else {
            std::fs::copy(entry.path(), &out)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

fn read_template_config(root: &Path) -> Result<TemplateConfig> {
    let path = root.join(TEMPLATE_CONFIG_FILE);
    if !path.is_file() {
        return Ok(TemplateConfig::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    TemplateConfig::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
