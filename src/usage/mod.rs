//! Dex usage bookkeeping
//!
//! Tracks which packages loaded which code files, under which user and ISA,
//! and whether the code was used outside its owning package.
//!
//! # Invariants
//!
//! - Primary and split code only sets the package-level flag; `dex_usage`
//!   holds secondary files only
//! - A secondary file's owner user never changes once recorded
//! - `used_by_other_apps` flags only go from false to true
//! - Loader ISAs are restricted to the supported vocabulary

pub mod codec;
pub mod info;
pub mod table;

pub use info::{DexUseInfo, PackageUseInfo, UserId};
pub use table::{ActiveUsers, SyncSummary, UsageMap, UsageTable};
