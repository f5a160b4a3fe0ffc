//! End-to-end pipeline runs against a local template and a scripted process runner

use scaffolder_core::progress::RecordingReporter;
use scaffolder_core::runtime::{OrchestrationStep, StepKind, Tool};
use scaffolder_core::templates::{ExcludeRules, ManifestSettings, SharedFile};
use scaffolder_core::{
    ErrorCategory, ProductConfig, RollbackPolicy, RuleSpec, ScaffoldError, ScaffoldOptions,
    Scaffolder, ScriptedRunner, Stage, StageStatus, TemplateFetcher, TemplateSource, Variant,
    VariantDescriptor,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Clone)]
struct BotConfig;

impl ProductConfig for BotConfig {
    fn name(&self) -> &'static str {
        "bot-test"
    }

    fn display_name(&self) -> &'static str {
        "Test Bot"
    }

    fn default_template_url(&self) -> &'static str {
        "https://example.invalid/bots.git"
    }

    fn template_url_env(&self) -> &'static str {
        "BOT_TEST_TEMPLATE_URL"
    }

    fn template_revision_env(&self) -> &'static str {
        "BOT_TEST_TEMPLATE_REV"
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
        variant.as_str()
    }

    fn shared_files(&self) -> Vec<SharedFile> {
        vec![SharedFile::new("REGISTER-BOT.md")]
    }

    fn exclude_rules(&self) -> ExcludeRules {
        ExcludeRules::new([".git", "target", ".dfx"])
    }

    fn docs_url(&self) -> &'static str {
        "https://example.invalid/docs"
    }

    fn next_steps(&self, _dir: &Path, _variant: Variant) -> Vec<String> {
        Vec::new()
    }

    fn cli_description(&self) -> &'static str {
        "test"
    }

    fn upgrade_command(&self) -> &'static str {
        "cargo install bot-test"
    }
}

fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn template() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_files(
        dir.path(),
        &[
            (
                "offchain-example/Cargo.toml",
                "[package]\nname = \"offchain_bot\"\nversion = \"0.1.0\"\n",
            ),
            (
                "offchain-example/scripts/setup_bot.sh",
                "#!/bin/sh\ndfx identity new bot_identity\ndfx identity use bot_identity\n",
            ),
            ("offchain-example/src/main.rs", "fn main() {}\n"),
            ("offchain-example/target/debug/stale", "old build output"),
            (
                "onchain-example/Cargo.toml",
                "[package]\nname = \"onchain_bot\"\nversion = \"0.1.0\"\n",
            ),
            (
                "onchain-example/scripts/deploy_bot.sh",
                "#!/bin/sh\ndfx deploy onchain_bot\n",
            ),
            ("onchain-example/src/lib.rs", "\n"),
            ("onchain-example/src/bot.did", "service : {}\n"),
            ("REGISTER-BOT.md", "# Registering your bot\n"),
            ("README.md", "# Templates\n"),
            (".git/HEAD", "ref: refs/heads/main\n"),
        ],
    );
    dir
}

fn options() -> ScaffoldOptions {
    ScaffoldOptions {
        check_tools: false,
        ..ScaffoldOptions::default()
    }
}

fn scaffolder(
    template: &Path,
    runner: Arc<ScriptedRunner>,
    options: ScaffoldOptions,
) -> Scaffolder<BotConfig> {
    let fetcher = TemplateFetcher::new(TemplateSource::local(template.to_path_buf()), "bot-test");
    Scaffolder::new(BotConfig, fetcher, Box::new(runner), options)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_offchain_bot_is_created_and_set_up() {
    let template = template();
    let work = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    let mut reporter = RecordingReporter::default();

    let outcome = scaffolder(template.path(), runner.clone(), options())
        .run(Variant::Offchain, "mybot123", work.path(), &mut reporter)
        .await
        .unwrap();

    let project = work.path().join("mybot123");
    assert_eq!(outcome.project_dir, project);
    assert!(outcome.manifest.is_none());

    assert!(read(&project.join("Cargo.toml")).contains("name = \"mybot123\""));
    let setup = read(&project.join("scripts/setup_bot.sh"));
    assert!(setup.contains("dfx identity new mybot123_identity"));
    assert!(setup.contains("dfx identity use mybot123_identity"));
    assert!(project.join("REGISTER-BOT.md").is_file());

    assert_eq!(
        runner.command_lines(),
        vec!["./scripts/setup_bot.sh".to_string(), "cargo build".to_string()]
    );
    assert!(runner.calls().iter().all(|call| call.cwd == project));

    let kinds: Vec<StepKind> = outcome.steps.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(kinds, vec![StepKind::Setup, StepKind::BuildVerification]);

    assert_eq!(
        reporter.stages_started(),
        vec![
            Stage::Validate,
            Stage::Fetch,
            Stage::Materialize,
            Stage::Rewrite,
            Stage::Step(StepKind::Setup),
            Stage::Step(StepKind::BuildVerification),
        ]
    );
}

#[tokio::test]
async fn test_onchain_bot_gets_manifest_and_deploys() {
    let template = template();
    let work = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    let mut reporter = RecordingReporter::default();

    let outcome = scaffolder(template.path(), runner.clone(), options())
        .run(Variant::Onchain, "tradebot", work.path(), &mut reporter)
        .await
        .unwrap();

    let project = work.path().join("tradebot");
    assert_eq!(outcome.manifest, Some(project.join("dfx.json")));

    let manifest: serde_json::Value =
        serde_json::from_str(&read(&project.join("dfx.json"))).unwrap();
    let canister = &manifest["canisters"]["tradebot"];
    assert_eq!(canister["type"], "rust");
    assert_eq!(canister["package"], "tradebot");
    assert_eq!(canister["candid"], "src/bot.did");
    assert_eq!(manifest["networks"]["local"]["bind"], "127.0.0.1:8080");
    assert_eq!(manifest["networks"]["local"]["type"], "ephemeral");
    assert_eq!(manifest["networks"]["local"]["replica"]["subnet_type"], "system");
    assert!(manifest["canisters"].get("onchain_bot").is_none());

    assert!(read(&project.join("scripts/deploy_bot.sh")).contains("dfx deploy tradebot"));
    assert_eq!(
        runner.command_lines(),
        vec!["./scripts/deploy_bot.sh".to_string()]
    );
    assert!(reporter.stages_started().contains(&Stage::Manifest));
}

#[tokio::test]
async fn test_only_the_selected_variant_ships() {
    let template = template();
    let work = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new());

    let outcome = scaffolder(template.path(), runner, options())
        .run(
            Variant::Offchain,
            "mybot",
            work.path(),
            &mut RecordingReporter::default(),
        )
        .await
        .unwrap();

    let project = work.path().join("mybot");
    assert!(!project.join("onchain-example").exists());
    assert!(!project.join("offchain-example").exists());
    assert!(!project.join("README.md").exists());
    assert!(!project.join(".git").exists());
    assert!(!project.join("target").exists());
    assert!(!project.join("dfx.json").exists());

    let mut files = outcome.files.clone();
    files.sort();
    assert_eq!(
        files,
        vec![
            "Cargo.toml".to_string(),
            "REGISTER-BOT.md".to_string(),
            "scripts/setup_bot.sh".to_string(),
            "src/main.rs".to_string(),
        ]
    );

    // Staging is cleaned up; the project is the only thing left
    assert_eq!(fs::read_dir(work.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_setup_failure_stops_the_build_and_keeps_the_project() {
    let template = template();
    let work = TempDir::new().unwrap();
    let runner = Arc::new(
        ScriptedRunner::new().with_exit("./scripts/setup_bot.sh", 3, "dfx: command not found\n"),
    );
    let mut reporter = RecordingReporter::default();

    let err = scaffolder(template.path(), runner.clone(), options())
        .run(Variant::Offchain, "mybot", work.path(), &mut reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, ScaffoldError::SetupScriptFailed(_)));
    assert_eq!(err.category(), ErrorCategory::Process);
    assert_eq!(err.exit_code(), 3);
    assert_eq!(
        err.process_failure().map(|f| f.stderr()),
        Some("dfx: command not found\n".to_string())
    );

    assert_eq!(runner.command_lines(), vec!["./scripts/setup_bot.sh".to_string()]);
    assert!(work.path().join("mybot/Cargo.toml").is_file());
    assert!(!reporter
        .stages_started()
        .contains(&Stage::Step(StepKind::BuildVerification)));
}

#[tokio::test]
async fn test_missing_literal_rolls_back() {
    let template = template();
    write_files(
        template.path(),
        &[("offchain-example/Cargo.toml", "[package]\nname = \"other\"\n")],
    );
    let work = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    let mut reporter = RecordingReporter::default();

    let err = scaffolder(template.path(), runner.clone(), options())
        .run(Variant::Offchain, "mybot", work.path(), &mut reporter)
        .await
        .unwrap_err();

    match &err {
        ScaffoldError::PlaceholderNotFound { file, literal } => {
            assert!(file.ends_with("Cargo.toml"));
            assert_eq!(literal, "name = \"offchain_bot\"");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!work.path().join("mybot").exists());
    assert!(runner.calls().is_empty());
    assert!(reporter.events.iter().any(|(stage, status)| *stage == Stage::Rollback
        && matches!(status, StageStatus::Succeeded(_))));
}

#[tokio::test]
async fn test_keep_partial_leaves_project_for_inspection() {
    let template = template();
    write_files(
        template.path(),
        &[("offchain-example/Cargo.toml", "[package]\nname = \"other\"\n")],
    );
    let work = TempDir::new().unwrap();
    let options = ScaffoldOptions {
        rollback: RollbackPolicy::KeepPartial,
        ..options()
    };

    let err = scaffolder(template.path(), Arc::new(ScriptedRunner::new()), options)
        .run(
            Variant::Offchain,
            "mybot",
            work.path(),
            &mut RecordingReporter::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Transform);
    assert!(work.path().join("mybot/Cargo.toml").is_file());
}

#[tokio::test]
async fn test_missing_template_leaves_nothing() {
    let work = TempDir::new().unwrap();
    let missing = work.path().join("no-such-template");

    let err = scaffolder(&missing, Arc::new(ScriptedRunner::new()), options())
        .run(
            Variant::Onchain,
            "tradebot",
            work.path(),
            &mut RecordingReporter::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ScaffoldError::FetchFailed { .. }));
    assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_invalid_name_touches_nothing() {
    let template = template();
    let work = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    let mut reporter = RecordingReporter::default();

    let err = scaffolder(template.path(), runner.clone(), options())
        .run(Variant::Onchain, "My Bot", work.path(), &mut reporter)
        .await
        .unwrap_err();

    assert!(matches!(err, ScaffoldError::InvalidName { .. }));
    assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
    assert!(runner.calls().is_empty());
    assert_eq!(reporter.stages_started(), vec![Stage::Validate]);
}

#[tokio::test]
async fn test_existing_target_is_left_alone() {
    let template = template();
    let work = TempDir::new().unwrap();
    write_files(work.path(), &[("mybot/notes.txt", "mine")]);

    let err = scaffolder(template.path(), Arc::new(ScriptedRunner::new()), options())
        .run(
            Variant::Offchain,
            "mybot",
            work.path(),
            &mut RecordingReporter::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ScaffoldError::TargetExists { .. }));
    assert_eq!(read(&work.path().join("mybot/notes.txt")), "mine");
    assert_eq!(fs::read_dir(work.path().join("mybot")).unwrap().count(), 1);
}

#[tokio::test]
async fn test_skip_scripts_reports_steps_as_skipped() {
    let template = template();
    let work = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new());
    let mut reporter = RecordingReporter::default();
    let options = ScaffoldOptions {
        run_scripts: false,
        ..options()
    };

    let outcome = scaffolder(template.path(), runner.clone(), options)
        .run(Variant::Offchain, "mybot", work.path(), &mut reporter)
        .await
        .unwrap();

    assert!(outcome.steps.is_empty());
    assert!(runner.calls().is_empty());
    let skipped = reporter
        .events
        .iter()
        .filter(|(_, status)| matches!(status, StageStatus::Skipped(_)))
        .count();
    assert_eq!(skipped, 2);
}

#[tokio::test]
async fn test_missing_tools_only_warn() {
    let template = template();
    let work = TempDir::new().unwrap();
    let runner = Arc::new(ScriptedRunner::new().with_exit("dfx --version", 127, "not found"));
    let options = ScaffoldOptions {
        check_tools: true,
        ..ScaffoldOptions::default()
    };

    let outcome = scaffolder(template.path(), runner.clone(), options)
        .run(
            Variant::Onchain,
            "tradebot",
            work.path(),
            &mut RecordingReporter::default(),
        )
        .await
        .unwrap();

    assert!(outcome.warnings.iter().any(|w| w.contains("dfx")));
    assert_eq!(
        runner.command_lines(),
        vec![
            "cargo --version".to_string(),
            "dfx --version".to_string(),
            "./scripts/deploy_bot.sh".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_template_config_adds_exclusions_and_warns_on_version() {
    let template = template();
    write_files(
        template.path(),
        &[
            (
                "template.yaml",
                "min_cli_version: \"99.0.0\"\nexclude:\n  - \"*.bak\"\n",
            ),
            ("offchain-example/src/old.rs.bak", "backup"),
        ],
    );
    let work = TempDir::new().unwrap();

    let outcome = scaffolder(template.path(), Arc::new(ScriptedRunner::new()), options())
        .run(
            Variant::Offchain,
            "mybot",
            work.path(),
            &mut RecordingReporter::default(),
        )
        .await
        .unwrap();

    assert!(!work.path().join("mybot/src/old.rs.bak").exists());
    assert!(!work.path().join("mybot/template.yaml").exists());
    assert!(outcome.warnings.iter().any(|w| w.contains("99.0.0")));
}
