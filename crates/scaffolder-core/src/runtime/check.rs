//! Detection of the external tools a generated project needs

use super::process::{Invocation, ProcessRunner};
use std::fmt;

/// External tools invoked while fetching, setting up, or deploying a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Git,
    Cargo,
    Dfx,
}

impl Tool {
    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Git => "git",
            Tool::Cargo => "cargo",
            Tool::Dfx => "dfx",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::Git => "Git",
            Tool::Cargo => "Cargo",
            Tool::Dfx => "dfx",
        }
    }

    pub fn install_hint(&self) -> &'static str {
        match self {
            Tool::Git => "install from https://git-scm.com",
            Tool::Cargo => "install from https://rustup.rs",
            Tool::Dfx => "install from https://internetcomputer.org/docs/building-apps/getting-started/install",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Tool detection result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeInfo {
    pub tool: Tool,
    pub version: Option<String>,
    pub available: bool,
}

/// Outcome of checking a set of tools
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolReport {
    pub available: Vec<RuntimeInfo>,
    pub missing: Vec<Tool>,
}

impl ToolReport {
    pub fn all_available(&self) -> bool {
        self.missing.is_empty()
    }

    /// One line per missing tool with its install hint
    pub fn missing_message(&self) -> String {
        format!(
            "Missing required tools:\n{}",
            self.missing
                .iter()
                .map(|t| format!("  - {} ({})", t.display_name(), t.install_hint()))
                .collect::<Vec<_>>()
                .join("\n")
        )
    }

    /// `Cargo (cargo 1.80.0), dfx (0.24.3)` style summary
    pub fn summary(&self) -> String {
        self.available
            .iter()
            .map(|r| format!("{} ({})", r.tool, r.version.as_deref().unwrap_or("unknown")))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Run `<tool> --version` and report whether it succeeded
pub fn check_tool(runner: &dyn ProcessRunner, tool: Tool) -> RuntimeInfo {
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::env::temp_dir());
    let invocation = Invocation::new(tool.binary(), cwd).arg("--version");

    match runner.run(&invocation) {
        Ok(out) if out.success() => RuntimeInfo {
            tool,
            version: Some(out.stdout_lossy().trim().to_string()),
            available: true,
        },
        _ => RuntimeInfo {
            tool,
            version: None,
            available: false,
        },
    }
}

/// Check every tool, deduplicated, in the given order
pub fn check_tools(runner: &dyn ProcessRunner, tools: &[Tool]) -> ToolReport {
    let mut report = ToolReport::default();
    let mut seen = Vec::new();

    for tool in tools {
        if seen.contains(tool) {
            continue;
        }
        seen.push(*tool);

        let info = check_tool(runner, *tool);
        if info.available {
            report.available.push(info);
        } else {
            report.missing.push(*tool);
        }
    }

    report
}
