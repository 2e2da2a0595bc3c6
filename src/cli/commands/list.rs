//! List command - show tracked packages

use super::open_store;
use crate::config::Config;
use crate::error::DexUseResult;

/// Execute the list command
pub async fn execute(config: &Config) -> DexUseResult<()> {
    let store = open_store(config);

    for name in store.table().package_names() {
        println!("{}", name);
    }

    Ok(())
}
