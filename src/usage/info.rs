//! Per-package and per-dex usage records

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// User identity owning a secondary dex file's storage
pub type UserId = i32;

/// How a package and its secondary dex files are used
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageUseInfo {
    /// Set once a primary or split apk of this package is loaded by another app
    pub(crate) used_by_other_apps: bool,

    /// Secondary dex files keyed by path; primary and split code never appears here
    pub(crate) dex_usage: BTreeMap<String, DexUseInfo>,
}

impl PackageUseInfo {
    pub fn is_used_by_other_apps(&self) -> bool {
        self.used_by_other_apps
    }

    pub fn dex_usage(&self) -> &BTreeMap<String, DexUseInfo> {
        &self.dex_usage
    }

    /// Look up a single secondary dex record
    pub fn dex(&self, dex_path: &str) -> Option<&DexUseInfo> {
        self.dex_usage.get(dex_path)
    }

    /// Nothing left worth tracking
    pub(crate) fn is_prunable(&self) -> bool {
        !self.used_by_other_apps && self.dex_usage.is_empty()
    }

    /// OR in the primary/split flag, returning whether it changed
    pub(crate) fn merge_used_by_other_apps(&mut self, used_by_other_apps: bool) -> bool {
        let old = self.used_by_other_apps;
        self.used_by_other_apps |= used_by_other_apps;
        old != self.used_by_other_apps
    }
}

/// Usage of one secondary dex file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DexUseInfo {
    pub(crate) owner_user_id: UserId,
    pub(crate) used_by_other_apps: bool,
    pub(crate) loader_isas: BTreeSet<String>,
}

impl DexUseInfo {
    pub(crate) fn new(owner_user_id: UserId, used_by_other_apps: bool) -> Self {
        Self {
            owner_user_id,
            used_by_other_apps,
            loader_isas: BTreeSet::new(),
        }
    }

    pub(crate) fn with_isa(mut self, isa: impl Into<String>) -> Self {
        self.loader_isas.insert(isa.into());
        self
    }

    pub fn owner_user_id(&self) -> UserId {
        self.owner_user_id
    }

    pub fn is_used_by_other_apps(&self) -> bool {
        self.used_by_other_apps
    }

    pub fn loader_isas(&self) -> &BTreeSet<String> {
        &self.loader_isas
    }

    /// Merge another observation of the same file.
    ///
    /// Owner must already have been checked by the caller. Returns true if
    /// either the flag or the ISA set grew.
    pub(crate) fn merge(&mut self, other: DexUseInfo) -> bool {
        let old_flag = self.used_by_other_apps;
        self.used_by_other_apps |= other.used_by_other_apps;

        let old_len = self.loader_isas.len();
        self.loader_isas.extend(other.loader_isas);

        old_flag != self.used_by_other_apps || old_len != self.loader_isas.len()
    }
}
