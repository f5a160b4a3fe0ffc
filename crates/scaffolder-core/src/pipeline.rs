//! The scaffolding pipeline
//!
//! Validate → Fetch → Materialize → Rewrite → Manifest (variant-conditional)
//! → Orchestrate. Every stage runs to completion before the next starts and
//! the first failure ends the run.

use crate::error::{ErrorCategory, ScaffoldError, ScaffoldResult};
use crate::product::ProductConfig;
use crate::progress::{ProgressReporter, Stage, StageStatus};
use crate::request::{ScaffoldRequest, Variant};
use crate::runtime::check::{check_tools, Tool};
use crate::runtime::orchestrator::{Orchestrator, StepKind};
use crate::runtime::process::{ProcessResult, ProcessRunner};
use crate::templates::fetcher::{StagedTemplate, TemplateFetcher};
use crate::templates::materializer::{self, MaterializePlan};
use crate::templates::{deploy, rewriter, version};
use crate::variant::VariantDescriptor;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// What happens to the project directory when a transform stage fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollbackPolicy {
    /// Delete the directory this run created
    #[default]
    RemovePartial,
    /// Leave the partial directory on disk for inspection
    KeepPartial,
}

#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub rollback: RollbackPolicy,
    /// Run the variant's setup/deploy/build steps after materializing
    pub run_scripts: bool,
    /// Check for the variant's tools before starting (warnings only)
    pub check_tools: bool,
    /// Version of the running CLI, compared against the template's minimum
    pub cli_version: String,
}

impl Default for ScaffoldOptions {
    fn default() -> Self {
        Self {
            rollback: RollbackPolicy::default(),
            run_scripts: true,
            check_tools: true,
            cli_version: crate::DEFAULT_CLI_VERSION.to_string(),
        }
    }
}

/// A successfully scaffolded project
#[derive(Debug, Clone)]
pub struct ScaffoldOutcome {
    pub project_dir: PathBuf,
    pub variant: Variant,
    /// Project-relative paths of every materialized file
    pub files: Vec<String>,
    pub rewritten: Vec<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub steps: Vec<(StepKind, ProcessResult)>,
    pub warnings: Vec<String>,
}

/// Drives one scaffolding run for a product
pub struct Scaffolder<C: ProductConfig> {
    config: C,
    fetcher: TemplateFetcher,
    runner: Box<dyn ProcessRunner>,
    options: ScaffoldOptions,
}

impl<C: ProductConfig> Scaffolder<C> {
    pub fn new(
        config: C,
        fetcher: TemplateFetcher,
        runner: Box<dyn ProcessRunner>,
        options: ScaffoldOptions,
    ) -> Self {
        Self {
            config,
            fetcher,
            runner,
            options,
        }
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        self.runner.as_ref()
    }

    pub fn options(&self) -> &ScaffoldOptions {
        &self.options
    }

    /// Validate raw input, then scaffold
    pub async fn run(
        &self,
        variant: Variant,
        raw_name: &str,
        base_dir: &Path,
        reporter: &mut dyn ProgressReporter,
    ) -> ScaffoldResult<ScaffoldOutcome> {
        reporter.report(Stage::Validate, StageStatus::Started);
        let request = match ScaffoldRequest::new(variant, raw_name, base_dir) {
            Ok(request) => request,
            Err(err) => {
                reporter.report(Stage::Validate, StageStatus::Failed(err.to_string()));
                return Err(err);
            }
        };
        reporter.report(
            Stage::Validate,
            StageStatus::Succeeded(format!("{} bot '{}'", variant, raw_name)),
        );

        self.scaffold(&request, reporter).await
    }

    /// Scaffold a validated request
    #[instrument(
        skip_all,
        fields(
            variant = %request.variant(),
            project = %request.project_name(),
            target = %request.target_path().display()
        )
    )]
    pub async fn scaffold(
        &self,
        request: &ScaffoldRequest,
        reporter: &mut dyn ProgressReporter,
    ) -> ScaffoldResult<ScaffoldOutcome> {
        let descriptor = self.config.variant(request.variant());
        let target = request.target_path();
        let mut warnings = Vec::new();

        if self.options.check_tools {
            self.report_tools(&descriptor, reporter, &mut warnings);
        }

        let staged = self.fetch(target, reporter, &mut warnings).await?;

        reporter.report(Stage::Materialize, StageStatus::Started);
        materializer::create_target(target).inspect_err(|err| {
            reporter.report(Stage::Materialize, StageStatus::Failed(err.to_string()));
        })?;

        let transformed = self.transform(request, &descriptor, &staged, reporter, &mut warnings);
        // The template is consumed; the staging directory goes away here
        drop(staged);

        let (files, rewritten, manifest) = match transformed {
            Ok(parts) => parts,
            Err(err) => {
                self.rollback(target, &err, reporter);
                return Err(err);
            }
        };

        let mut orchestrator = Orchestrator::new(self.runner.as_ref());
        let steps = if self.options.run_scripts {
            orchestrator.run(target, &descriptor.orchestration_steps, reporter)?
        } else {
            orchestrator.skip(&descriptor.orchestration_steps, reporter);
            Vec::new()
        };

        info!(files = files.len(), "project scaffolded");
        Ok(ScaffoldOutcome {
            project_dir: target.to_path_buf(),
            variant: request.variant(),
            files,
            rewritten,
            manifest,
            steps,
            warnings,
        })
    }

    fn report_tools(
        &self,
        descriptor: &VariantDescriptor,
        reporter: &mut dyn ProgressReporter,
        warnings: &mut Vec<String>,
    ) {
        let mut tools = Vec::new();
        if self.fetcher.source().is_git() {
            tools.push(Tool::Git);
        }
        if self.options.run_scripts {
            tools.extend(descriptor.required_tools.iter().copied());
        }
        if tools.is_empty() {
            return;
        }

        reporter.report(Stage::ToolCheck, StageStatus::Started);
        let report = check_tools(self.runner.as_ref(), &tools);
        if report.all_available() {
            reporter.report(Stage::ToolCheck, StageStatus::Succeeded(report.summary()));
        } else {
            let message = report.missing_message();
            warn!("{}", message);
            reporter.report(Stage::ToolCheck, StageStatus::Warning(message.clone()));
            warnings.push(message);
        }
    }

    async fn fetch(
        &self,
        target: &Path,
        reporter: &mut dyn ProgressReporter,
        warnings: &mut Vec<String>,
    ) -> ScaffoldResult<StagedTemplate> {
        reporter.report(Stage::Fetch, StageStatus::Started);

        let staging_parent = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let staged = self
            .fetcher
            .fetch(self.runner.as_ref(), staging_parent)
            .await
            .inspect_err(|err| {
                reporter.report(Stage::Fetch, StageStatus::Failed(err.to_string()));
            })?;

        reporter.report(
            Stage::Fetch,
            StageStatus::Succeeded(format!("Template fetched from {}", self.fetcher.source())),
        );

        if let Some(warning) = version::check_compatibility(
            &self.options.cli_version,
            staged.config(),
            self.config.upgrade_command(),
        ) {
            reporter.report(Stage::Fetch, StageStatus::Warning(warning.clone()));
            warnings.push(warning);
        }

        Ok(staged)
    }

    /// Materialize, rewrite, and synthesize the manifest into the (empty) target
    fn transform(
        &self,
        request: &ScaffoldRequest,
        descriptor: &VariantDescriptor,
        staged: &StagedTemplate,
        reporter: &mut dyn ProgressReporter,
        warnings: &mut Vec<String>,
    ) -> ScaffoldResult<(Vec<String>, Vec<PathBuf>, Option<PathBuf>)> {
        let target = request.target_path();

        let mut plan = MaterializePlan {
            subpath: descriptor.template_subpath.to_string(),
            shared_files: self.config.shared_files(),
            exclude: self.config.exclude_rules(),
        };
        plan.shared_files
            .extend(staged.config().shared_files.iter().cloned());
        plan.exclude.merge(&staged.config().exclude);

        let report = stage(reporter, Stage::Materialize, || {
            materializer::materialize(staged.root(), &plan, target)
        })?;
        for missing in &report.missing_shared {
            let warning = format!("Template is missing shared file {}", missing);
            reporter.report(Stage::Materialize, StageStatus::Warning(warning.clone()));
            warnings.push(warning);
        }
        reporter.report(
            Stage::Materialize,
            StageStatus::Succeeded(format!(
                "Created {} files in {}",
                report.files.len(),
                target.display()
            )),
        );

        reporter.report(Stage::Rewrite, StageStatus::Started);
        let rules = descriptor.rules_for(request.project_name());
        let rewritten = stage(reporter, Stage::Rewrite, || rewriter::apply_rules(target, &rules))?;
        reporter.report(
            Stage::Rewrite,
            StageStatus::Succeeded(format!("Renamed identifiers in {} files", rewritten.len())),
        );

        let manifest = match &descriptor.manifest {
            Some(settings) => {
                reporter.report(Stage::Manifest, StageStatus::Started);
                let (path, _) = stage(reporter, Stage::Manifest, || {
                    deploy::write_manifest(target, request.project_name(), settings)
                })?;
                reporter.report(
                    Stage::Manifest,
                    StageStatus::Succeeded(format!("Wrote {}", settings.file_name)),
                );
                Some(path)
            }
            None => None,
        };

        Ok((report.files, rewritten, manifest))
    }

    fn rollback(&self, target: &Path, err: &ScaffoldError, reporter: &mut dyn ProgressReporter) {
        if err.category() != ErrorCategory::Transform {
            return;
        }
        match self.options.rollback {
            RollbackPolicy::KeepPartial => {
                reporter.report(
                    Stage::Rollback,
                    StageStatus::Skipped(format!(
                        "Partial project left at {} for inspection",
                        target.display()
                    )),
                );
            }
            RollbackPolicy::RemovePartial => {
                reporter.report(Stage::Rollback, StageStatus::Started);
                match std::fs::remove_dir_all(target) {
                    Ok(()) => reporter.report(
                        Stage::Rollback,
                        StageStatus::Succeeded(format!("Removed {}", target.display())),
                    ),
                    Err(e) => {
                        warn!(target = %target.display(), error = %e, "rollback failed");
                        reporter.report(
                            Stage::Rollback,
                            StageStatus::Failed(format!(
                                "Could not remove {}: {}",
                                target.display(),
                                e
                            )),
                        );
                    }
                }
            }
        }
    }
}

/// Run one stage body, reporting its failure
fn stage<T>(
    reporter: &mut dyn ProgressReporter,
    stage: Stage,
    body: impl FnOnce() -> ScaffoldResult<T>,
) -> ScaffoldResult<T> {
    body().inspect_err(|err| reporter.report(stage, StageStatus::Failed(err.to_string())))
}
