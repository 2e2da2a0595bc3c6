//! dexuse - Package dex usage store
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use dexuse::cli::{Cli, Commands};
use dexuse::config::{Config, ConfigManager};
use dexuse::error::DexUseResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DexUseResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;
    if let Some(ref file) = cli.file {
        config.store.path = Some(file.clone());
    }

    init_logging(cli.verbose, &config);

    match cli.command {
        Commands::Record(args) => dexuse::cli::commands::record(args, &config).await,
        Commands::Show(args) => dexuse::cli::commands::show(args, &config).await,
        Commands::List => dexuse::cli::commands::list(&config).await,
        Commands::Dump => dexuse::cli::commands::dump(&config).await,
        Commands::Sync(args) => dexuse::cli::commands::sync(args, &config).await,
        Commands::Clear => dexuse::cli::commands::clear(&config).await,
        Commands::Config(args) => {
            dexuse::cli::commands::config(args, &config, cli.config).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; config can force verbose or JSON output
fn init_logging(verbose: u8, config: &Config) {
    let level = match (verbose, config.general.verbose) {
        (0, false) => "warn",
        (0, true) | (1, _) => "info",
        _ => "debug",
    };
    let filter = EnvFilter::new(format!("dexuse={}", level));

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
    }
}
