//! Dump command - print the encoded usage table

use super::open_store;
use crate::config::Config;
use crate::error::DexUseResult;

/// Execute the dump command
pub async fn execute(config: &Config) -> DexUseResult<()> {
    let store = open_store(config);
    print!("{}", store.dump()?);
    Ok(())
}
