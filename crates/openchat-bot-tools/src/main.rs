//! create-openchat-bot - Project scaffolding for OpenChat bots

mod logging;

use clap::Parser;
use scaffolder_core::runtime::{OrchestrationStep, StepKind, Tool};
use scaffolder_core::templates::{ExcludeRules, ManifestSettings, SharedFile};
use scaffolder_core::tui::CreateArgs;
use scaffolder_core::{ProductConfig, RuleSpec, Variant, VariantDescriptor};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// OpenChat product configuration
#[derive(Clone)]
pub struct OpenChatConfig;

impl ProductConfig for OpenChatConfig {
    fn name(&self) -> &'static str {
        "create-openchat-bot"
    }

    fn display_name(&self) -> &'static str {
        "OpenChat Bot"
    }

    fn default_template_url(&self) -> &'static str {
        "https://github.com/ICP-HUBS-DevRels-Syndicate/openchat-bots.git"
    }

    fn template_url_env(&self) -> &'static str {
        "OPENCHAT_BOT_TEMPLATE_URL"
    }

    fn template_revision_env(&self) -> &'static str {
        "OPENCHAT_BOT_TEMPLATE_REV"
    }

    fn variant(&self, variant: Variant) -> VariantDescriptor {
        match variant {
            Variant::Offchain => VariantDescriptor {
                variant,
                template_subpath: "offchain-example",
                placeholder_rules: vec![
                    RuleSpec {
                        file: "Cargo.toml",
                        find: "name = \"offchain_bot\"",
                        replace: "name = \"{name}\"",
                    },
                    RuleSpec {
                        file: "scripts/setup_bot.sh",
                        find: "bot_identity",
                        replace: "{name}_identity",
                    },
                ],
                orchestration_steps: vec![
                    OrchestrationStep::script(StepKind::Setup, "scripts/setup_bot.sh"),
                    OrchestrationStep::command(StepKind::BuildVerification, "cargo", &["build"]),
                ],
                manifest: None,
                required_tools: vec![Tool::Cargo],
            },
            Variant::Onchain => VariantDescriptor {
                variant,
                template_subpath: "onchain-example",
                placeholder_rules: vec![
                    RuleSpec {
                        file: "Cargo.toml",
                        find: "name = \"onchain_bot\"",
                        replace: "name = \"{name}\"",
                    },
                    RuleSpec {
                        file: "scripts/deploy_bot.sh",
                        find: "onchain_bot",
                        replace: "{name}",
                    },
                ],
                orchestration_steps: vec![OrchestrationStep::script(
                    StepKind::Deploy,
                    "scripts/deploy_bot.sh",
                )],
                manifest: Some(ManifestSettings::local_replica()),
                required_tools: vec![Tool::Cargo, Tool::Dfx],
            },
        }
    }

    fn variant_label(&self, variant: Variant) -> &'static str {
        match variant {
            Variant::Offchain => "Offchain bot (runs as a local server)",
            Variant::Onchain => "Onchain bot (deploys as an IC canister)",
        }
    }

    fn shared_files(&self) -> Vec<SharedFile> {
        vec![SharedFile::new("REGISTER-BOT.md")]
    }

    fn exclude_rules(&self) -> ExcludeRules {
        ExcludeRules::new([".git", "node_modules", "target", ".dfx"])
    }

    fn docs_url(&self) -> &'static str {
        "https://github.com/open-chat-labs/open-chat-bots"
    }

    fn next_steps(&self, dir: &Path, variant: Variant) -> Vec<String> {
        let mut steps = Vec::new();
        let current = std::env::current_dir().ok();

        if current.as_deref() != Some(dir) {
            let shown = current
                .as_deref()
                .and_then(|cwd| dir.strip_prefix(cwd).ok())
                .unwrap_or(dir);
            steps.push(format!("cd {}", shown.display()));
        }

        match variant {
            Variant::Offchain => steps.push("cargo run".to_string()),
            Variant::Onchain => steps.push("./scripts/deploy_bot.sh".to_string()),
        }

        steps.push("Follow the registration instructions in REGISTER-BOT.md".to_string());
        steps
    }

    fn cli_description(&self) -> &'static str {
        "Create a new OpenChat bot from the official templates"
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install openchat-bot-tools --force"
    }
}

#[derive(Parser, Debug)]
#[command(name = "create-openchat-bot")]
#[command(about = "Create a new OpenChat bot from the official templates")]
#[command(version)]
pub struct Args {
    /// Bot type to create (offchain or onchain)
    #[arg(long)]
    pub variant: Option<Variant>,

    /// Bot name; also the directory the bot is created in
    #[arg(short, long)]
    pub name: Option<String>,

    /// Local directory to use for templates instead of fetching from remote (for development use)
    #[arg(long = "template-dir")]
    pub template_dir: Option<PathBuf>,

    /// Template repository URL (git remote or .zip archive)
    #[arg(long = "template-url", conflicts_with = "template_dir")]
    pub template_url: Option<String>,

    /// Git revision of the template repository
    #[arg(long, conflicts_with = "template_dir")]
    pub revision: Option<String>,

    /// Leave a partially created bot on disk when a step fails
    #[arg(long = "keep-on-failure")]
    pub keep_on_failure: bool,

    /// Only create the files; don't run the setup, deploy, or build steps
    #[arg(long = "skip-scripts")]
    pub skip_scripts: bool,

    /// Skip the cargo/dfx installation check
    #[arg(long = "skip-tool-check")]
    pub skip_tool_check: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl From<Args> for CreateArgs {
    fn from(args: Args) -> Self {
        CreateArgs {
            template_dir: args.template_dir,
            template_url: args.template_url,
            revision: args.revision,
            variant: args.variant,
            name: args.name,
            keep_on_failure: args.keep_on_failure,
            skip_scripts: args.skip_scripts,
            skip_tool_check: args.skip_tool_check,
            yes: args.yes,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    let args = Args::parse();
    if let Err(e) = logging::init_logging(args.verbose) {
        eprintln!("{e}");
    }

    let config = OpenChatConfig;
    let result = scaffolder_core::run(&config, args.into(), CLI_VERSION).await;

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    match result {
        Ok(outcome) => {
            tracing::info!(dir = %outcome.project_dir.display(), "bot created");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(category = ?err.category(), "scaffolding failed");
            ExitCode::from(err.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_flags() {
        let args = Args::parse_from([
            "create-openchat-bot",
            "--variant",
            "onchain",
            "--name",
            "tradebot",
            "--keep-on-failure",
            "-vv",
        ]);
        assert_eq!(args.variant, Some(Variant::Onchain));
        assert_eq!(args.name.as_deref(), Some("tradebot"));
        assert!(args.keep_on_failure);
        assert_eq!(args.verbose, 2);

        let create: CreateArgs = args.into();
        assert_eq!(create.variant, Some(Variant::Onchain));
        assert!(create.keep_on_failure);
        assert!(!create.skip_scripts);
    }

    #[test]
    fn test_rejects_unknown_variant() {
        assert!(Args::try_parse_from(["create-openchat-bot", "--variant", "sidechain"]).is_err());
    }

    #[test]
    fn test_offchain_descriptor() {
        let d = OpenChatConfig.variant(Variant::Offchain);
        assert_eq!(d.template_subpath, "offchain-example");
        assert!(d.manifest.is_none());

        let rules = d.rules_for("mybot123");
        assert_eq!(rules[0].replace, "name = \"mybot123\"");
        assert_eq!(rules[1].file, PathBuf::from("scripts/setup_bot.sh"));
        assert_eq!(rules[1].replace, "mybot123_identity");

        let kinds: Vec<StepKind> = d.orchestration_steps.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StepKind::Setup, StepKind::BuildVerification]);
    }

    #[test]
    fn test_onchain_descriptor() {
        let d = OpenChatConfig.variant(Variant::Onchain);
        assert_eq!(d.template_subpath, "onchain-example");
        assert_eq!(d.manifest, Some(ManifestSettings::local_replica()));

        let rules = d.rules_for("tradebot");
        assert_eq!(rules[1].find, "onchain_bot");
        assert_eq!(rules[1].replace, "tradebot");

        let kinds: Vec<StepKind> = d.orchestration_steps.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![StepKind::Deploy]);
        assert!(d.required_tools.contains(&Tool::Dfx));
    }

    #[test]
    fn test_next_steps_end_with_registration() {
        let dir = std::env::temp_dir().join("mybot");
        let steps = OpenChatConfig.next_steps(&dir, Variant::Offchain);
        assert!(steps.contains(&"cargo run".to_string()));
        assert_eq!(
            steps.last().map(String::as_str),
            Some("Follow the registration instructions in REGISTER-BOT.md")
        );

        let steps = OpenChatConfig.next_steps(&dir, Variant::Onchain);
        assert!(steps.contains(&"./scripts/deploy_bot.sh".to_string()));
    }
}
