//! Blocking invocation of external processes
//!
//! Every external step (template fetch, setup/deploy script, build
//! verification) goes through a [`ProcessRunner`], so the pipeline can be
//! driven by a scripted runner in tests.

use crate::error::{ScaffoldError, ScaffoldResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Outcome of one external invocation. Exit code 0 is the only success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// A program, its arguments, and the directory it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Capability to run an external process to completion
pub trait ProcessRunner: Send + Sync {
    /// Run the invocation and wait for it to exit.
    ///
    /// A non-zero exit is still `Ok`; only failing to start the program is an error.
    fn run(&self, invocation: &Invocation) -> ScaffoldResult<ProcessResult>;
}

/// Runs programs with `std::process::Command`, capturing both output streams
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> ScaffoldResult<ProcessResult> {
        debug!(command = %invocation, cwd = %invocation.cwd.display(), "running");

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ScaffoldError::Spawn {
                program: invocation.program.clone(),
                reason: e.to_string(),
            })?;

        // Killed by a signal: no code, report as a generic failure
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(command = %invocation, exit_code, "finished");

        Ok(ProcessResult {
            exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

type Action = Box<dyn Fn(&Invocation) + Send + Sync>;

struct Script {
    prefix: String,
    result: ProcessResult,
    action: Option<Action>,
}

/// In-memory runner that records invocations and replays scripted results.
///
/// An invocation matches the first script whose prefix its command line starts
/// with; unmatched invocations succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: Vec<Script>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make commands starting with `prefix` exit with `code` and print `stderr`
    pub fn with_exit(mut self, prefix: &str, code: i32, stderr: &str) -> Self {
        self.scripts.push(Script {
            prefix: prefix.to_string(),
            result: ProcessResult {
                exit_code: code,
                stdout: Vec::new(),
                stderr: stderr.as_bytes().to_vec(),
            },
            action: None,
        });
        self
    }

    /// Run `action` (e.g. to create files a real command would) and succeed
    pub fn with_action<F>(mut self, prefix: &str, action: F) -> Self
    where
        F: Fn(&Invocation) + Send + Sync + 'static,
    {
        self.scripts.push(Script {
            prefix: prefix.to_string(),
            result: ProcessResult {
                exit_code: 0,
                stdout: Vec::new(),
                stderr: Vec::new(),
            },
            action: Some(Box::new(action)),
        });
        self
    }

    /// Every invocation so far, in order
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Command lines of every invocation so far
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> ScaffoldResult<ProcessResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }

        let line = invocation.to_string();
        match self.scripts.iter().find(|s| line.starts_with(&s.prefix)) {
            Some(script) => {
                if let Some(action) = &script.action {
                    action(invocation);
                }
                Ok(script.result.clone())
            }
            None => Ok(ProcessResult {
                exit_code: 0,
                stdout: Vec::new(),
                stderr: Vec::new(),
            }),
        }
    }
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for Arc<R> {
    fn run(&self, invocation: &Invocation) -> ScaffoldResult<ProcessResult> {
        (**self).run(invocation)
    }
}

/// Set the executable bits on a script copied out of the template
pub fn make_executable(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(perms.mode() | 0o111);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
