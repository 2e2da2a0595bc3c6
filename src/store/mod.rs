//! Durable storage for the usage table

pub mod atomic;
pub mod persist;

pub use atomic::{AtomicFile, FsAtomicFile};
pub use persist::{DexUsageStore, LoadOutcome};
