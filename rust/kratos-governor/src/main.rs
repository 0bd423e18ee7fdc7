// KratOs Governor - Entry point
// Principle: Power is slow

use clap::Parser;
use kratos_governor::cli::config::GovernorConfig;
use kratos_governor::cli::runner::{compute_ids, print_report, run_scenario};
use kratos_governor::cli::scenario::Scenario;
use kratos_governor::cli::{Cli, Commands, ConfigSubcommand, DemoScenario};
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_filter = if cli.verbose {
        "debug"
    } else {
        &cli.log_level
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter)),
        )
        .init();

    print_banner();

    match cli.command {
        Commands::Demo(cmd) => {
            let config = load_config(cmd.config.as_deref())?;
            let scenario = match cmd.scenario {
                DemoScenario::ReleaseFunds => Scenario::release_funds(),
                DemoScenario::Refuse => Scenario::refuse(),
            };
            let report = run_scenario(config, &scenario).map_err(|e| {
                error!("Scenario error: {}", e);
                e
            })?;
            print_report(&report)?;
        }

        Commands::Run(cmd) => {
            let config = load_config(cmd.config.as_deref())?;
            let scenario = Scenario::load(&cmd.scenario)
                .map_err(|e| anyhow::anyhow!("Scenario {}: {}", cmd.scenario.display(), e))?;
            let report = run_scenario(config, &scenario).map_err(|e| {
                error!("Scenario error: {}", e);
                e
            })?;
            print_report(&report)?;
        }

        Commands::Hash(cmd) => {
            let ids = compute_ids(&cmd.targets, &cmd.values, &cmd.payloads, &cmd.description)?;
            println!("Description hash: {}", ids.description_hash.to_hex());
            println!("Proposal id:      {}", ids.proposal_id.to_hex());
            println!("Operation id:     {}", ids.operation_id.to_hex());
        }

        Commands::Config(cmd) => match cmd.subcommand {
            ConfigSubcommand::Init { output, force } => {
                if output.exists() && !force {
                    return Err(anyhow::anyhow!(
                        "{} already exists (use --force to overwrite)",
                        output.display()
                    ));
                }
                GovernorConfig::default().save(&output)?;
                info!("Default config written to {}", output.display());
            }
            ConfigSubcommand::Show { config } => {
                let config = GovernorConfig::load(&config)?;
                println!("{}", toml::to_string_pretty(&config)?);
            }
        },
    }

    info!("Goodbye!");
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GovernorConfig> {
    match path {
        Some(path) => GovernorConfig::load(path).map_err(|e| {
            error!("Configuration error: {}", e);
            anyhow::anyhow!("Configuration error: {}", e)
        }),
        None => Ok(GovernorConfig::default()),
    }
}

/// Print the KratOs banner
fn print_banner() {
    println!(r#"
    ╔═══════════════════════════════════════════════════════════╗
    ║                                                           ║
    ║                K R A T O S   G O V E R N O R              ║
    ║                                                           ║
    ║              Propose • Vote • Wait • Execute              ║
    ║                                                           ║
    ╚═══════════════════════════════════════════════════════════╝
    "#);
    println!("    Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
}
