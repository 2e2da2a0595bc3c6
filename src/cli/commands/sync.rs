//! Sync command - prune usage for removed packages and users

use super::open_store;
use crate::cli::args::SyncArgs;
use crate::config::Config;
use crate::error::DexUseResult;
use crate::usage::ActiveUsers;
use console::style;
use tracing::info;

/// Execute the sync command
pub async fn execute(args: SyncArgs, config: &Config) -> DexUseResult<()> {
    let store = open_store(config);

    let mut active = ActiveUsers::new();
    for (package, users) in args.active {
        active.entry(package).or_default().extend(users);
    }

    let summary = store.sync_data(&active);
    info!(
        "Sync removed {} packages and {} dex files",
        summary.packages_removed, summary.dex_files_removed
    );

    if summary.packages_removed > 0 || summary.dex_files_removed > 0 {
        store.flush().await?;
    }

    println!(
        "{} Removed {} package(s) and {} dex file(s)",
        style("✓").green(),
        summary.packages_removed,
        summary.dex_files_removed
    );
    Ok(())
}
