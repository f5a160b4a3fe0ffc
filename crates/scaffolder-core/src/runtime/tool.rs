//! Guided installation of external tools
//!
//! Used by the interactive flow when a variant needs a tool (e.g. `dfx`)
//! that is not on the PATH.

use super::check::{check_tool, RuntimeInfo, Tool};
use super::process::ProcessRunner;
use anyhow::Result;
use colored::Colorize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

/// Timeout for installation (5 minutes, the dfx installer downloads a toolchain)
const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for an installable tool
#[derive(Debug, Clone)]
pub struct ToolConfig {
    pub tool: Tool,
    /// URL to the install script
    pub install_script_url: &'static str,
    /// URL to the documentation
    pub docs_url: &'static str,
}

/// Manager for checking and installing a CLI tool
pub struct ToolManager {
    config: ToolConfig,
}

impl ToolManager {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Get the install command string
    pub fn install_command(&self) -> String {
        format!("curl -fsSL {} | sh", self.config.install_script_url)
    }

    pub fn detect(&self, runner: &dyn ProcessRunner) -> RuntimeInfo {
        check_tool(runner, self.config.tool)
    }

    /// Install the tool using its official install script, streaming its output
    pub async fn install(&self) -> Result<()> {
        let cmd = self.install_command();
        println!();
        println!("{} {}", "Running:".dimmed(), cmd.yellow());
        println!();

        let mut child = TokioCommand::new("sh")
            .arg("-c")
            .arg(&cmd)
            .env("DFXVM_INIT_YES", "true")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to capture installer stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("Failed to capture installer stderr"))?;

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();

        let output_task = async {
            let mut stderr_open = true;
            loop {
                tokio::select! {
                    line = stdout_reader.next_line() => {
                        match line {
                            Ok(Some(line)) => println!("  {}", line),
                            Ok(None) => break,
                            Err(e) => {
                                eprintln!("{} {}", "Error reading stdout:".red(), e);
                                break;
                            }
                        }
                    }
                    line = stderr_reader.next_line(), if stderr_open => {
                        match line {
                            Ok(Some(line)) => eprintln!("  {}", line.yellow()),
                            Ok(None) => stderr_open = false,
                            Err(e) => {
                                eprintln!("{} {}", "Error reading stderr:".red(), e);
                                stderr_open = false;
                            }
                        }
                    }
                }
            }
        };

        if timeout(INSTALL_TIMEOUT, output_task).await.is_err() {
            let _ = child.kill().await;
            println!();
            anyhow::bail!(
                "Installation timed out after {} seconds.\n\
                 Please try again later or install manually:\n\
                 {}",
                INSTALL_TIMEOUT.as_secs(),
                cmd
            );
        }

        match timeout(Duration::from_secs(5), child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                println!();
                Ok(())
            }
            Ok(Ok(status)) => anyhow::bail!(
                "Installation failed with exit code: {}\n\
                 Please try installing manually: {}",
                status.code().unwrap_or(-1),
                cmd
            ),
            Ok(Err(e)) => anyhow::bail!("Failed to wait for installer: {}", e),
            Err(_) => {
                let _ = child.kill().await;
                anyhow::bail!(
                    "Installation process hung. Please try installing manually:\n{}",
                    cmd
                );
            }
        }
    }

    /// Open the tool's documentation in the default browser
    pub fn open_docs(&self) -> Result<()> {
        println!(
            "{}",
            format!(
                "Opening {} documentation in your browser...",
                self.config.tool.display_name()
            )
            .cyan()
        );
        open::that(self.config.docs_url)?;
        Ok(())
    }
}

/// Pre-configured tool manager for the Internet Computer SDK
pub fn dfx_tool() -> ToolManager {
    ToolManager::new(ToolConfig {
        tool: Tool::Dfx,
        install_script_url: "https://internetcomputer.org/install.sh",
        docs_url: "https://internetcomputer.org/docs/building-apps/getting-started/install",
    })
}

/// Tools that have a guided installer
pub fn installer_for(tool: Tool) -> Option<ToolManager> {
    match tool {
        Tool::Dfx => Some(dfx_tool()),
        Tool::Git | Tool::Cargo => None,
    }
}
