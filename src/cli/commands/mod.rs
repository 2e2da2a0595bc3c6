//! CLI command implementations

pub mod clear;
pub mod config;
pub mod dump;
pub mod list;
pub mod record;
pub mod show;
pub mod sync;

pub use clear::execute as clear;
pub use config::execute as config;
pub use dump::execute as dump;
pub use list::execute as list;
pub use record::execute as record;
pub use show::execute as show;
pub use sync::execute as sync;

use crate::config::Config;
use crate::store::{DexUsageStore, LoadOutcome};
use console::style;

/// Open the configured store and read the usage file
pub(crate) fn open_store(config: &Config) -> DexUsageStore {
    let store = DexUsageStore::open(config);
    if let LoadOutcome::Discarded { reason } = store.load() {
        eprintln!(
            "{} Ignoring unreadable usage file: {}",
            style("!").yellow(),
            reason
        );
    }
    store
}
