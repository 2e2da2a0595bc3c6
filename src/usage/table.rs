//! Lock-guarded in-memory usage table
//!
//! `record` runs on the code-loading path: it only touches the map under
//! a single lock and never performs I/O. Anything handed out of the table
//! is a deep copy.

use crate::error::{DexUseError, DexUseResult};
use crate::isa::IsaSet;
use crate::usage::codec;
use crate::usage::info::{DexUseInfo, PackageUseInfo, UserId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Package name to usage info
pub type UsageMap = BTreeMap<String, PackageUseInfo>;

/// Active users for every installed package
pub type ActiveUsers = HashMap<String, HashSet<UserId>>;

/// What `sync_data` removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub packages_removed: usize,
    pub dex_files_removed: usize,
}

/// Process-wide usage table
#[derive(Debug)]
pub struct UsageTable {
    packages: Mutex<UsageMap>,
    isas: IsaSet,
}

impl UsageTable {
    /// Create an empty table accepting loader ISAs from `isas`
    pub fn new(isas: IsaSet) -> Self {
        Self {
            packages: Mutex::new(UsageMap::new()),
            isas,
        }
    }

    /// Supported loader ISA vocabulary
    pub fn isas(&self) -> &IsaSet {
        &self.isas
    }

    /// Record a dex file load.
    ///
    /// `primary_or_split` folds the load into the package-level flag; ISA and
    /// owner only matter for secondary files. Returns true if the load is new
    /// information. Names the usage file cannot hold are rejected.
    pub fn record(
        &self,
        owning_package: &str,
        dex_path: &str,
        owner_user_id: UserId,
        loader_isa: &str,
        used_by_other_apps: bool,
        primary_or_split: bool,
    ) -> DexUseResult<bool> {
        if !self.isas.contains(loader_isa) {
            return Err(DexUseError::UnsupportedIsa {
                isa: loader_isa.to_string(),
            });
        }
        codec::check_package_name(owning_package)?;
        if !primary_or_split {
            codec::check_dex_path(dex_path)?;
        }

        let mut packages = self.packages.lock();

        let Some(package) = packages.get_mut(owning_package) else {
            let mut package = PackageUseInfo::default();
            if primary_or_split {
                package.used_by_other_apps = used_by_other_apps;
            } else {
                package.dex_usage.insert(
                    dex_path.to_string(),
                    DexUseInfo::new(owner_user_id, used_by_other_apps).with_isa(loader_isa),
                );
            }
            packages.insert(owning_package.to_string(), package);
            return Ok(true);
        };

        if primary_or_split {
            return Ok(package.merge_used_by_other_apps(used_by_other_apps));
        }

        let update = DexUseInfo::new(owner_user_id, used_by_other_apps).with_isa(loader_isa);
        match package.dex_usage.get_mut(dex_path) {
            None => {
                package.dex_usage.insert(dex_path.to_string(), update);
                Ok(true)
            }
            Some(existing) if existing.owner_user_id != owner_user_id => {
                Err(DexUseError::OwnerMismatch {
                    dex_path: dex_path.to_string(),
                    existing: existing.owner_user_id,
                    requested: owner_user_id,
                })
            }
            Some(existing) => Ok(existing.merge(update)),
        }
    }

    /// Copy of the usage info for one package
    pub fn get_package_use_info(&self, package_name: &str) -> Option<PackageUseInfo> {
        self.packages.lock().get(package_name).cloned()
    }

    /// Drop entries for uninstalled packages and removed users
    pub fn sync_data(&self, active_users: &ActiveUsers) -> SyncSummary {
        let mut summary = SyncSummary::default();
        let mut packages = self.packages.lock();

        packages.retain(|name, package| {
            let Some(users) = active_users.get(name) else {
                debug!("Dropping usage for uninstalled package {}", name);
                summary.packages_removed += 1;
                summary.dex_files_removed += package.dex_usage.len();
                return false;
            };

            let before = package.dex_usage.len();
            package
                .dex_usage
                .retain(|_, dex| users.contains(&dex.owner_user_id));
            summary.dex_files_removed += before - package.dex_usage.len();

            if package.is_prunable() {
                debug!("Dropping empty usage record for package {}", name);
                summary.packages_removed += 1;
                return false;
            }
            true
        });

        summary
    }

    /// Drop everything
    pub fn clear(&self) {
        self.packages.lock().clear();
    }

    /// Deep copy of the whole table, taken under the lock
    pub fn snapshot(&self) -> UsageMap {
        self.packages.lock().clone()
    }

    /// Replace the whole table with `packages`
    pub fn replace(&self, packages: UsageMap) {
        *self.packages.lock() = packages;
    }

    pub fn len(&self) -> usize {
        self.packages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.lock().is_empty()
    }

    /// Names of all tracked packages
    pub fn package_names(&self) -> Vec<String> {
        self.packages.lock().keys().cloned().collect()
    }
}
