//! Sequential execution of a variant's setup, deploy, and build steps

use super::process::{make_executable, Invocation, ProcessResult, ProcessRunner};
use crate::error::{ProcessFailure, ScaffoldError, ScaffoldResult};
use crate::progress::{ProgressReporter, Stage, StageStatus};
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Setup,
    Deploy,
    BuildVerification,
}

impl StepKind {
    pub fn description(&self) -> &'static str {
        match self {
            StepKind::Setup => "Running setup script",
            StepKind::Deploy => "Running deploy script",
            StepKind::BuildVerification => "Verifying build",
        }
    }

    fn failure(self, failure: ProcessFailure) -> ScaffoldError {
        match self {
            StepKind::Setup => ScaffoldError::SetupScriptFailed(failure),
            StepKind::Deploy => ScaffoldError::DeployScriptFailed(failure),
            StepKind::BuildVerification => ScaffoldError::BuildVerificationFailed(failure),
        }
    }
}

/// One external invocation, run from the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationStep {
    pub kind: StepKind,
    pub program: String,
    pub args: Vec<String>,
    /// Set the executable bit on `program` (a project-relative script) first
    pub make_executable: bool,
}

impl OrchestrationStep {
    /// A script shipped in the project, e.g. `scripts/setup_bot.sh`
    pub fn script(kind: StepKind, relative_path: &str) -> Self {
        Self {
            kind,
            program: format!("./{}", relative_path.trim_start_matches("./")),
            args: Vec::new(),
            make_executable: true,
        }
    }

    /// A program found on the PATH
    pub fn command(kind: StepKind, program: &str, args: &[&str]) -> Self {
        Self {
            kind,
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            make_executable: false,
        }
    }

    fn invocation(&self, project_root: &Path) -> Invocation {
        Invocation::new(&self.program, project_root).args(self.args.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running(StepKind),
    Succeeded,
    Failed(StepKind, ProcessResult),
}

/// Runs steps strictly in order; the first failure is terminal
pub struct Orchestrator<'a> {
    runner: &'a dyn ProcessRunner,
    state: RunState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(runner: &'a dyn ProcessRunner) -> Self {
        Self {
            runner,
            state: RunState::Pending,
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    #[instrument(skip_all, fields(root = %project_root.display()))]
    pub fn run(
        &mut self,
        project_root: &Path,
        steps: &[OrchestrationStep],
        reporter: &mut dyn ProgressReporter,
    ) -> ScaffoldResult<Vec<(StepKind, ProcessResult)>> {
        let mut results = Vec::with_capacity(steps.len());

        for step in steps {
            self.state = RunState::Running(step.kind);
            reporter.report(Stage::Step(step.kind), StageStatus::Started);

            let invocation = step.invocation(project_root);
            let outcome = self.invoke(step, &invocation, project_root);

            let result = match outcome {
                Ok(result) => result,
                Err(err) => {
                    self.state = RunState::Failed(
                        step.kind,
                        ProcessResult {
                            exit_code: 127,
                            stdout: Vec::new(),
                            stderr: err.to_string().into_bytes(),
                        },
                    );
                    reporter.report(Stage::Step(step.kind), StageStatus::Failed(err.to_string()));
                    return Err(err);
                }
            };

            if !result.success() {
                let failure = ProcessFailure::new(invocation.to_string(), result.clone());
                let err = step.kind.failure(failure);
                self.state = RunState::Failed(step.kind, result);
                reporter.report(Stage::Step(step.kind), StageStatus::Failed(err.to_string()));
                return Err(err);
            }

            info!(step = ?step.kind, command = %invocation, "step succeeded");
            reporter.report(
                Stage::Step(step.kind),
                StageStatus::Succeeded(format!("`{}` finished", invocation)),
            );
            results.push((step.kind, result));
        }

        self.state = RunState::Succeeded;
        Ok(results)
    }

    /// Report every step as skipped without running anything
    pub fn skip(&mut self, steps: &[OrchestrationStep], reporter: &mut dyn ProgressReporter) {
        for step in steps {
            reporter.report(
                Stage::Step(step.kind),
                StageStatus::Skipped("scripts disabled".to_string()),
            );
        }
        self.state = RunState::Succeeded;
    }

    fn invoke(
        &self,
        step: &OrchestrationStep,
        invocation: &Invocation,
        project_root: &Path,
    ) -> ScaffoldResult<ProcessResult> {
        if step.make_executable {
            let script = project_root.join(step.program.trim_start_matches("./"));
            make_executable(&script).map_err(|e| ScaffoldError::Spawn {
                program: step.program.clone(),
                reason: format!("cannot make script executable: {}", e),
            })?;
        }
        self.runner.run(invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingReporter;
    use crate::runtime::process::ScriptedRunner;

    fn offchain_steps() -> Vec<OrchestrationStep> {
        vec![
            OrchestrationStep::script(StepKind::Setup, "scripts/setup_bot.sh"),
            OrchestrationStep::command(StepKind::BuildVerification, "cargo", &["build"]),
        ]
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("scripts")).unwrap();
        std::fs::write(dir.path().join("scripts/setup_bot.sh"), "#!/bin/sh\n").unwrap();
        dir
    }

    #[test]
    fn test_runs_all_steps_in_order() {
        let dir = project();
        let runner = ScriptedRunner::new();
        let mut reporter = RecordingReporter::default();
        let mut orchestrator = Orchestrator::new(&runner);

        let results = orchestrator
            .run(dir.path(), &offchain_steps(), &mut reporter)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(orchestrator.state(), &RunState::Succeeded);
        assert_eq!(
            runner.command_lines(),
            vec!["./scripts/setup_bot.sh", "cargo build"]
        );
        assert!(runner.calls().iter().all(|c| c.cwd == dir.path()));
    }

    #[test]
    fn test_setup_failure_halts_before_build() {
        let dir = project();
        let runner = ScriptedRunner::new().with_exit("./scripts/setup_bot.sh", 4, "identity exists");
        let mut reporter = RecordingReporter::default();
        let mut orchestrator = Orchestrator::new(&runner);

        let err = orchestrator
            .run(dir.path(), &offchain_steps(), &mut reporter)
            .unwrap_err();

        assert!(matches!(err, ScaffoldError::SetupScriptFailed(_)));
        assert_eq!(err.exit_code(), 4);
        assert_eq!(
            err.process_failure().unwrap().stderr(),
            "identity exists"
        );
        assert_eq!(runner.command_lines(), vec!["./scripts/setup_bot.sh"]);
        assert!(matches!(
            orchestrator.state(),
            RunState::Failed(StepKind::Setup, r) if r.exit_code == 4
        ));
        assert_eq!(
            reporter.stages_started(),
            vec![Stage::Step(StepKind::Setup)]
        );
    }

    #[test]
    fn test_build_failure_is_classified() {
        let dir = project();
        let runner = ScriptedRunner::new().with_exit("cargo build", 101, "error[E0425]");
        let mut orchestrator = Orchestrator::new(&runner);

        let err = orchestrator
            .run(dir.path(), &offchain_steps(), &mut RecordingReporter::default())
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::BuildVerificationFailed(_)));
        assert_eq!(err.exit_code(), 101);
    }

    #[test]
    fn test_missing_script_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new();
        let steps = vec![OrchestrationStep::script(StepKind::Deploy, "scripts/deploy_bot.sh")];
        let mut orchestrator = Orchestrator::new(&runner);

        let err = orchestrator
            .run(dir.path(), &steps, &mut RecordingReporter::default())
            .unwrap_err();
        assert!(matches!(err, ScaffoldError::Spawn { .. }));
        assert!(runner.calls().is_empty());
        assert!(matches!(orchestrator.state(), RunState::Failed(StepKind::Deploy, _)));
    }

    #[test]
    fn test_skip_runs_nothing() {
        let runner = ScriptedRunner::new();
        let mut reporter = RecordingReporter::default();
        let mut orchestrator = Orchestrator::new(&runner);

        orchestrator.skip(&offchain_steps(), &mut reporter);
        assert!(runner.calls().is_empty());
        assert_eq!(reporter.events.len(), 2);
        assert!(reporter
            .events
            .iter()
            .all(|(_, status)| matches!(status, StageStatus::Skipped(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_script_is_made_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = project();
        let runner = ScriptedRunner::new();
        let mut orchestrator = Orchestrator::new(&runner);
        orchestrator
            .run(dir.path(), &offchain_steps(), &mut RecordingReporter::default())
            .unwrap();

        let mode = std::fs::metadata(dir.path().join("scripts/setup_bot.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
