//! External processes and tools
//!
//! This module provides:
//! - A blocking process-runner capability with a system and a scripted implementation
//! - The orchestrator that runs a variant's setup/deploy/build steps
//! - Tool detection (git, cargo, dfx) and guided dfx installation

pub mod check;
pub mod orchestrator;
pub mod process;
pub mod tool;

pub use check::{check_tool, check_tools, RuntimeInfo, Tool, ToolReport};
pub use orchestrator::{OrchestrationStep, Orchestrator, RunState, StepKind};
pub use process::{Invocation, ProcessResult, ProcessRunner, ScriptedRunner, SystemRunner};
pub use tool::ToolManager;
