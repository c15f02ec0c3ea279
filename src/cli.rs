use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use reconcile::ObjectKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "floe")]
#[command(version)]
#[command(about = "Reconcile warehouse access-control objects with a declarative spec", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/floe/config.toml)
    #[arg(short, long, global = true, env = "FLOE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the statements that would bring the account in line with the spec
    Plan(PlanArgs),

    /// Apply the plan to the account
    Apply(ApplyArgs),

    /// Load and validate the spec without touching the account
    Validate(SpecArgs),

    /// Print the current state of the account as JSON
    Inspect {
        /// Only this kind (warehouse, database, role, user, schema)
        kind: Option<ObjectKind>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Clone)]
pub struct SpecArgs {
    /// Spec document (overrides the config file)
    #[arg(short, long)]
    pub spec: Option<PathBuf>,
}

#[derive(Args, Clone)]
pub struct SelectionArgs {
    /// Only reconcile these kinds (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<ObjectKind>,

    /// Never drop objects missing from the spec
    #[arg(long)]
    pub no_drop: bool,
}

#[derive(Args, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub spec: SpecArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Show what would run without running it
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Stop at the first failed statement
    #[arg(long)]
    pub fail_fast: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}
