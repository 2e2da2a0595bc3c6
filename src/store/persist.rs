//! Usage file persistence
//!
//! `DexUsageStore` owns the usage table and its backing file. Reads happen
//! once at startup and are fail-open. Writes are snapshot-then-encode: the
//! table lock is held only for the deep copy, never across I/O. Background
//! write requests coalesce into a single pending write of the latest state.

use crate::config::Config;
use crate::error::{DexUseError, DexUseResult};
use crate::store::atomic::{AtomicFile, FsAtomicFile};
use crate::usage::codec;
use crate::usage::info::{PackageUseInfo, UserId};
use crate::usage::table::{ActiveUsers, SyncSummary, UsageTable};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Result of reading the usage file at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No file yet; the table starts empty
    Missing,
    /// File parsed and installed into the table
    Loaded { packages: usize },
    /// File unreadable or corrupt; the table was left as it was
    Discarded { reason: String },
}

/// Usage table plus its durable copy
#[derive(Clone)]
pub struct DexUsageStore {
    inner: Arc<Inner>,
}

struct Inner {
    table: UsageTable,
    file: Box<dyn AtomicFile>,
    write_delay: Duration,
    /// A background write has been scheduled but has not snapshotted yet
    pending: AtomicBool,
    /// Serializes writers so an older snapshot never lands after a newer one
    write_lock: Mutex<()>,
}

impl DexUsageStore {
    pub fn new(table: UsageTable, file: impl AtomicFile + 'static, write_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                table,
                file: Box::new(file),
                write_delay,
                pending: AtomicBool::new(false),
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Build a store backed by the configured usage file
    pub fn open(config: &Config) -> Self {
        let table = UsageTable::new(config.isa.vocabulary());
        let file = FsAtomicFile::new(config.store.file_path());
        Self::new(table, file, config.store.write_delay())
    }

    pub fn table(&self) -> &UsageTable {
        &self.inner.table
    }

    /// See [`UsageTable::record`]
    pub fn record(
        &self,
        owning_package: &str,
        dex_path: &str,
        owner_user_id: UserId,
        loader_isa: &str,
        used_by_other_apps: bool,
        primary_or_split: bool,
    ) -> DexUseResult<bool> {
        self.inner.table.record(
            owning_package,
            dex_path,
            owner_user_id,
            loader_isa,
            used_by_other_apps,
            primary_or_split,
        )
    }

    pub fn get_package_use_info(&self, package_name: &str) -> Option<PackageUseInfo> {
        self.inner.table.get_package_use_info(package_name)
    }

    pub fn sync_data(&self, active_users: &ActiveUsers) -> SyncSummary {
        self.inner.table.sync_data(active_users)
    }

    pub fn clear(&self) {
        self.inner.table.clear();
    }

    /// Read the usage file into the table.
    ///
    /// A missing file is a normal first start. Any other failure is logged
    /// and the table is left untouched.
    pub fn load(&self) -> LoadOutcome {
        match self.try_load() {
            Ok(None) => {
                debug!("No usage file at {}", self.inner.file.describe());
                LoadOutcome::Missing
            }
            Ok(Some(packages)) => {
                info!(
                    "Loaded usage for {} packages from {}",
                    packages,
                    self.inner.file.describe()
                );
                LoadOutcome::Loaded { packages }
            }
            Err(e) => {
                warn!("Failed to parse package dex usage: {}", e);
                LoadOutcome::Discarded {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Alias of [`Self::load`]
    pub fn read(&self) -> LoadOutcome {
        self.load()
    }

    /// Read and install the usage file, surfacing any failure
    pub fn try_load(&self) -> DexUseResult<Option<usize>> {
        let content = self
            .inner
            .file
            .read()
            .map_err(|e| DexUseError::io(format!("reading {}", self.inner.file.describe()), e))?;
        let Some(content) = content else {
            return Ok(None);
        };

        let packages = codec::decode(content.as_bytes(), self.inner.table.isas())?;
        let count = packages.len();
        self.inner.table.replace(packages);
        Ok(Some(count))
    }

    /// Schedule a background write of the latest state.
    ///
    /// Returns immediately. Requests made while a write is pending are
    /// folded into it. Without a tokio runtime the write runs on a helper
    /// thread.
    pub fn request_async_persist(&self) {
        if self.inner.pending.swap(true, Ordering::AcqRel) {
            return;
        }

        let write = PendingWrite::new(Arc::clone(&self.inner));
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime, writing usage file from a helper thread");
            let spawned = std::thread::Builder::new()
                .name("dex-usage-writer".to_string())
                .spawn(move || {
                    std::thread::sleep(write.delay());
                    write.run();
                });
            if let Err(e) = spawned {
                error!("Failed to start usage writer thread: {}", e);
            }
            return;
        };

        handle.spawn(async move {
            tokio::time::sleep(write.delay()).await;
            if let Err(e) = tokio::task::spawn_blocking(move || write.run()).await {
                error!("Usage writer task failed: {}", e);
            }
        });
    }

    /// True while a background write is scheduled but has not snapshotted yet
    pub fn is_write_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Snapshot and write synchronously
    pub fn persist(&self) -> DexUseResult<()> {
        let _guard = self.inner.write_lock.lock();
        self.inner.write_snapshot()
    }

    /// Write the latest state now, off the async executor
    pub async fn flush(&self) -> DexUseResult<()> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let _guard = inner.write_lock.lock();
            inner.pending.store(false, Ordering::Release);
            inner.write_snapshot()
        })
        .await
        .map_err(|e| DexUseError::Internal(format!("usage writer task failed: {}", e)))?
    }

    /// Encoded form of the current table, for diagnostics
    pub fn dump(&self) -> DexUseResult<String> {
        codec::encode(&self.inner.table.snapshot())
    }
}

/// A scheduled background write.
///
/// Dropping it before `run` (runtime shutdown, cancelled task, thread that
/// never started) clears the pending flag so the next request schedules
/// again.
struct PendingWrite {
    inner: Arc<Inner>,
    armed: bool,
}

impl PendingWrite {
    fn new(inner: Arc<Inner>) -> Self {
        Self { inner, armed: true }
    }

    fn delay(&self) -> Duration {
        self.inner.write_delay
    }

    fn run(mut self) {
        self.armed = false;
        self.inner.write_pending();
    }
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        if self.armed {
            debug!("Scheduled usage write dropped before running");
            self.inner.pending.store(false, Ordering::Release);
        }
    }
}

impl Inner {
    fn write_pending(&self) {
        let _guard = self.write_lock.lock();
        // Cleared before the snapshot so later records schedule a new write.
        self.pending.store(false, Ordering::Release);
        if let Err(e) = self.write_snapshot() {
            error!("Failed to write usage for dex files: {}", e);
        }
    }

    fn write_snapshot(&self) -> DexUseResult<()> {
        let snapshot = self.table.snapshot();
        let content = codec::encode(&snapshot)?;
        self.file
            .write(&content)
            .map_err(|e| DexUseError::io(format!("writing {}", self.file.describe()), e))?;
        debug!(
            "Wrote usage for {} packages to {}",
            snapshot.len(),
            self.file.describe()
        );
        Ok(())
    }
}
