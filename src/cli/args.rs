//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// dexuse - package dex usage store
///
/// Inspect and maintain the record of which packages loaded which code
/// files, for which users and instruction sets.
#[derive(Parser, Debug)]
#[command(name = "dexuse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DEXUSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Usage file path (overrides store.path)
    #[arg(short, long, global = true, env = "DEXUSE_FILE")]
    pub file: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a dex file load
    Record(RecordArgs),

    /// Show usage recorded for a package
    Show(ShowArgs),

    /// List packages with recorded usage
    List,

    /// Print the usage file contents as they would be written
    Dump,

    /// Drop usage for uninstalled packages and removed users
    Sync(SyncArgs),

    /// Drop all recorded usage
    Clear,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the record command
#[derive(Parser, Debug)]
pub struct RecordArgs {
    /// Package that owns the loaded code
    pub package: String,

    /// Path of the loaded dex file
    pub dex_path: String,

    /// User owning the dex file
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    pub user: i32,

    /// Instruction set of the loading process
    #[arg(short, long)]
    pub isa: String,

    /// The file was loaded by a package other than its owner
    #[arg(long)]
    pub other_apps: bool,

    /// The file is the package's primary or split apk
    #[arg(long)]
    pub primary: bool,
}

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Package name
    pub package: String,

    /// Output format
    #[arg(short = 'o', long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the sync command
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Installed package and its active users (PACKAGE=UID,UID...)
    #[arg(short, long = "active", value_parser = parse_active_users)]
    pub active: Vec<(String, Vec<i32>)>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

/// Output format for the show command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one dex path per line)
    Plain,
}

/// Parse PACKAGE=UID,UID... into a package name and its user ids
fn parse_active_users(s: &str) -> Result<(String, Vec<i32>), String> {
    let (package, users) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid PACKAGE=UIDS: no '=' found in '{}'", s))?;
    if package.is_empty() {
        return Err(format!("invalid PACKAGE=UIDS: empty package in '{}'", s));
    }

    let users = users
        .split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(|u| {
            u.parse::<i32>()
                .map_err(|_| format!("invalid user id '{}' in '{}'", u, s))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((package.to_string(), users))
}
