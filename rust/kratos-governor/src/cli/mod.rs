// CLI - Command Line Interface for the KratOs governor
// Principle: Simple, clear, composable commands

pub mod config;
pub mod runner;
pub mod scenario;

use crate::types::{AccountId, Balance};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// KratOs Governor - Token-weighted proposals behind a timelock
#[derive(Parser, Debug)]
#[command(name = "kratos-governor")]
#[command(author = "KratOs Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "KratOs governor - vote, wait, then execute")]
#[command(long_about = r#"
Drives the KratOs governance lifecycle on a simulated chain.

Core Principles:
  - Power is slow: approved actions wait out a timelock
  - Weight is fixed at the snapshot: late tokens do not vote
  - What was approved is exactly what runs

Run the release-funds demo:
  kratos-governor demo release-funds

Run a custom scenario:
  kratos-governor run --scenario scenario.toml --config governor.toml
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", env = "KRATOS_GOV_LOG")]
    pub log_level: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a built-in demo scenario
    Demo(DemoCmd),

    /// Run a scenario file
    Run(RunCmd),

    /// Compute description hash, proposal id and operation id
    Hash(HashCmd),

    /// Configuration management
    Config(ConfigCmd),
}

#[derive(Parser, Debug)]
pub struct DemoCmd {
    #[command(subcommand)]
    pub scenario: DemoScenario,

    /// Governor config file (defaults if not specified)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoScenario {
    /// Five voters approve releasing the treasury; queue, wait, execute
    ReleaseFunds,

    /// Five voters reject the same proposal; queueing is refused
    Refuse,
}

/// Run a scenario file
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Scenario file (TOML)
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Governor config file (defaults if not specified)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Identifier computation. Without targets, hashes the demo proposal.
#[derive(Parser, Debug)]
pub struct HashCmd {
    /// Call target (repeat for each call)
    #[arg(long = "target", value_name = "ADDRESS")]
    pub targets: Vec<AccountId>,

    /// Call value (repeat for each call)
    #[arg(long = "value")]
    pub values: Vec<Balance>,

    /// Call payload as hex (repeat for each call)
    #[arg(long = "payload", value_name = "HEX")]
    pub payloads: Vec<String>,

    /// Proposal description
    #[arg(long, default_value = scenario::RELEASE_FUNDS_DESCRIPTION)]
    pub description: String,
}

#[derive(Parser, Debug)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub subcommand: ConfigSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Write the default configuration
    Init {
        /// Output file
        #[arg(short, long, default_value = "governor.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate and print a configuration
    Show {
        /// Config file
        config: PathBuf,
    },
}
