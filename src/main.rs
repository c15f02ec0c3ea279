mod cli;
mod commands;
mod config;
mod engine;
mod filter;
mod inspector;
mod loader;
mod normalize;
mod password;
mod progress;
mod snowsql;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_path: cli.config,
    };

    match cli.command {
        Command::Plan(args) => commands::reconcile::plan(&ctx, &args),
        Command::Apply(args) => commands::reconcile::apply(&ctx, &args),
        Command::Validate(args) => commands::validate::run(&ctx, &args),
        Command::Inspect { kind } => commands::inspect::run(&ctx, kind),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "floe", &mut io::stdout());
            Ok(())
        }
    }
}
