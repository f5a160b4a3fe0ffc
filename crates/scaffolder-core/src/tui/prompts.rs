//! Charm-style CLI prompts using cliclack

use super::reporter::SpinnerReporter;
use crate::error::{ScaffoldError, ScaffoldResult};
use crate::pipeline::{RollbackPolicy, ScaffoldOptions, ScaffoldOutcome, Scaffolder};
use crate::product::ProductConfig;
use crate::request::{validate_name, ScaffoldRequest, Variant};
use crate::runtime::check::{check_tools, Tool};
use crate::runtime::process::SystemRunner;
use crate::runtime::tool;
use crate::templates::fetcher::{TemplateFetcher, TemplateSource};
use console::style;
use std::path::{Path, PathBuf};

/// CLI arguments for the create command
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Local directory to use for templates instead of fetching from remote
    pub template_dir: Option<PathBuf>,

    /// Template repository URL (git remote or .zip archive)
    pub template_url: Option<String>,

    /// Template git revision
    pub revision: Option<String>,

    /// Variant to create; prompted if absent
    pub variant: Option<Variant>,

    /// Project name; prompted if absent
    pub name: Option<String>,

    /// Leave a partially created project on disk when a step fails
    pub keep_on_failure: bool,

    /// Stop after writing files; don't run setup/deploy/build
    pub skip_scripts: bool,

    /// Skip the tool installation check
    pub skip_tool_check: bool,

    /// Auto-confirm all prompts (non-interactive mode)
    pub yes: bool,
}

/// Run the CLI with interactive prompts.
///
/// Failures are rendered here; the returned error only carries the exit code.
pub async fn run<C: ProductConfig>(
    config: &C,
    args: CreateArgs,
    cli_version: &str,
) -> ScaffoldResult<ScaffoldOutcome> {
    cliclack::intro(format!("Welcome to {} Creator!", config.display_name()))?;

    let result = create(config, &args, cli_version).await;
    match &result {
        Ok(outcome) => print_next_steps(config, outcome)?,
        Err(err) => report_failure(err)?,
    }
    result
}

async fn create<C: ProductConfig>(
    config: &C,
    args: &CreateArgs,
    cli_version: &str,
) -> ScaffoldResult<ScaffoldOutcome> {
    let base_dir = std::env::current_dir()?;

    // Step 1: Select variant
    let variant = select_variant(config, args)?;

    // Step 2: Project name (validated before anything touches the disk)
    let request = select_name(args, variant, &base_dir)?;

    // Step 3: Check tools the variant's scripts need
    let descriptor = config.variant(variant);
    if args.skip_scripts {
        cliclack::log::info("Skipping setup scripts")?;
    } else if args.skip_tool_check {
        cliclack::log::info("Skipping tool check")?;
    } else {
        handle_tool_check(&descriptor.required_tools, args).await?;
    }

    // Step 4: Setup template fetcher
    let fetcher = setup_fetcher(config, args)?;

    // Step 5: Materialize and run
    let options = ScaffoldOptions {
        rollback: if args.keep_on_failure {
            RollbackPolicy::KeepPartial
        } else {
            RollbackPolicy::RemovePartial
        },
        run_scripts: !args.skip_scripts,
        check_tools: false,
        cli_version: cli_version.to_string(),
    };
    let scaffolder = Scaffolder::new(config.clone(), fetcher, Box::new(SystemRunner), options);
    let mut reporter = SpinnerReporter::new();

    scaffolder.scaffold(&request, &mut reporter).await
}

fn select_variant<C: ProductConfig>(config: &C, args: &CreateArgs) -> ScaffoldResult<Variant> {
    if let Some(variant) = args.variant {
        cliclack::log::info(format!("Bot type: {}", config.variant_label(variant)))?;
        return Ok(variant);
    }

    let mut select = cliclack::select("Which type of bot do you want to create?");
    for variant in Variant::ALL {
        select = select.item(variant, config.variant_label(variant), "");
    }
    Ok(select.interact()?)
}

fn select_name(args: &CreateArgs, variant: Variant, base_dir: &Path) -> ScaffoldResult<ScaffoldRequest> {
    if let Some(name) = &args.name {
        let request = ScaffoldRequest::new(variant, name, base_dir)?;
        cliclack::log::info(format!("Bot name: {}", name))?;
        return Ok(request);
    }

    let name: String = cliclack::input("What is the name of your bot?")
        .placeholder("my_bot")
        .validate(|input: &String| match validate_name(input) {
            Ok(()) => Ok(()),
            Err(ScaffoldError::InvalidName { reason, .. }) => Err(reason),
            Err(_) => Err("Invalid bot name"),
        })
        .interact()?;

    ScaffoldRequest::new(variant, &name, base_dir)
}

async fn handle_tool_check(tools: &[Tool], args: &CreateArgs) -> ScaffoldResult<()> {
    if tools.is_empty() {
        return Ok(());
    }

    let report = check_tools(&SystemRunner, tools);
    if !report.available.is_empty() {
        cliclack::log::success(format!("Detected tools: {}", report.summary()))?;
    }

    for missing in &report.missing {
        cliclack::log::warning(format!(
            "{} is not installed ({})",
            missing.display_name(),
            missing.install_hint()
        ))?;

        let Some(installer) = tool::installer_for(*missing) else {
            continue;
        };

        // In non-interactive mode, just continue
        if args.yes {
            cliclack::log::info(format!(
                "Continuing without {} (--yes mode)",
                missing.display_name()
            ))?;
            continue;
        }

        let action: &str = cliclack::select("What would you like to do?")
            .item(
                "install",
                format!("Install {} automatically", missing.display_name()),
                "",
            )
            .item(
                "docs",
                format!("Open documentation ({})", installer.config().docs_url),
                "",
            )
            .item(
                "skip",
                format!("Skip and continue without {}", missing.display_name()),
                "",
            )
            .interact()?;

        match action {
            "install" => {
                cliclack::log::info(format!("This will execute: {}", installer.install_command()))?;

                let confirm: bool = cliclack::confirm("Proceed with installation?")
                    .initial_value(true)
                    .interact()?;

                if !confirm {
                    continue;
                }
                match installer.install().await {
                    Ok(()) => {
                        cliclack::log::success(format!(
                            "{} installed successfully",
                            missing.display_name()
                        ))?;
                    }
                    Err(e) => {
                        cliclack::log::error(format!("{}", e))?;

                        let continue_anyway: bool = cliclack::confirm(format!(
                            "Continue without {}?",
                            missing.display_name()
                        ))
                        .initial_value(false)
                        .interact()?;

                        if !continue_anyway {
                            return Err(ScaffoldError::Cancelled);
                        }
                    }
                }
            }
            "docs" => {
                if let Err(e) = installer.open_docs() {
                    cliclack::log::warning(format!("Could not open browser: {}", e))?;
                }
                cliclack::log::info(format!(
                    "After installing {}, run this command again.",
                    missing.display_name()
                ))?;
                return Err(ScaffoldError::Cancelled);
            }
            _ => {
                cliclack::log::info(format!(
                    "Continuing without {}. Refer to the docs for installation instructions: ({})",
                    missing.display_name(),
                    installer.config().docs_url
                ))?;
            }
        }
    }

    Ok(())
}

fn setup_fetcher<C: ProductConfig>(config: &C, args: &CreateArgs) -> ScaffoldResult<TemplateFetcher> {
    let source = match &args.template_dir {
        Some(path) => {
            cliclack::log::info(format!("Using local template from {}", path.display()))?;
            TemplateSource::local(path.clone())
        }
        None => {
            let source =
                TemplateSource::from_config(config, args.template_url.clone(), args.revision.clone())?;
            cliclack::log::info(format!("Using template {}", source))?;
            source
        }
    };

    Ok(TemplateFetcher::new(source, config.user_agent()))
}

fn report_failure(err: &ScaffoldError) -> ScaffoldResult<()> {
    if let ScaffoldError::Cancelled = err {
        cliclack::outro_cancel("Setup cancelled.")?;
        return Ok(());
    }

    cliclack::log::error(format!("Error: {}", err))?;
    if let Some(failure) = err.process_failure() {
        let stderr = failure.stderr();
        if !stderr.trim().is_empty() {
            cliclack::note("stderr", stderr.trim_end())?;
        }
    }
    cliclack::outro_cancel("Failed to create bot")?;
    Ok(())
}

fn print_next_steps<C: ProductConfig>(config: &C, outcome: &ScaffoldOutcome) -> ScaffoldResult<()> {
    let steps = config.next_steps(&outcome.project_dir, outcome.variant);

    println!();
    println!("  Next steps");
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, style(step).cyan());
    }

    cliclack::outro("Bot created successfully! Happy bot building!")?;

    Ok(())
}
