//! Clear command - drop all recorded usage

use crate::config::Config;
use crate::error::DexUseResult;
use crate::store::DexUsageStore;
use console::style;

/// Execute the clear command
///
/// Skips reading the existing file so a corrupt one can be replaced.
pub async fn execute(config: &Config) -> DexUseResult<()> {
    let store = DexUsageStore::open(config);
    store.clear();
    store.flush().await?;

    println!(
        "{} Cleared usage file {}",
        style("✓").green(),
        config.store.file_path().display()
    );
    Ok(())
}
