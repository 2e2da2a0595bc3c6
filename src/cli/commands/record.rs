//! Record command - record a single dex load

use super::open_store;
use crate::cli::args::RecordArgs;
use crate::config::Config;
use crate::error::DexUseResult;
use console::style;
use tracing::debug;

/// Execute the record command
pub async fn execute(args: RecordArgs, config: &Config) -> DexUseResult<()> {
    let store = open_store(config);

    let changed = store.record(
        &args.package,
        &args.dex_path,
        args.user,
        &args.isa,
        args.other_apps,
        args.primary,
    )?;

    if !changed {
        debug!("Load of {} already known", args.dex_path);
        println!(
            "{} Usage of {} by {} already recorded",
            style("-").dim(),
            style(&args.dex_path).cyan(),
            style(&args.package).cyan()
        );
        return Ok(());
    }

    store.flush().await?;
    println!(
        "{} Recorded usage of {} by {}",
        style("✓").green(),
        style(&args.dex_path).cyan(),
        style(&args.package).cyan()
    );

    Ok(())
}
