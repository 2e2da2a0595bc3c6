//! dexuse - Package dex usage store
//!
//! Records which packages loaded which executable code files, under which
//! user and instruction set, and whether the code was used by another app.
//! The record is kept in memory behind a single lock and persisted to a
//! versioned text file with atomic replace.

pub mod cli;
pub mod config;
pub mod error;
pub mod isa;
pub mod store;
pub mod usage;

pub use error::{DexUseError, DexUseResult};
pub use isa::IsaSet;
pub use store::{DexUsageStore, LoadOutcome};
pub use usage::{DexUseInfo, PackageUseInfo, UsageTable};
