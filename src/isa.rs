//! Instruction set vocabulary
//!
//! The usage table only accepts loader ISAs drawn from a known vocabulary.
//! The vocabulary is derived from the ABI strings the device supports.

use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Resolve an ABI string to the instruction set it runs on
pub fn instruction_set_for_abi(abi: &str) -> Option<&'static str> {
    match abi {
        "armeabi" | "armeabi-v7a" => Some("arm"),
        "arm64-v8a" => Some("arm64"),
        "x86" => Some("x86"),
        "x86_64" => Some("x86_64"),
        "riscv64" => Some("riscv64"),
        _ => None,
    }
}

/// ABI strings supported by the architecture this binary was built for
pub fn host_abis() -> Vec<String> {
    let abis: &[&str] = match std::env::consts::ARCH {
        "aarch64" => &["arm64-v8a", "armeabi-v7a", "armeabi"],
        "arm" => &["armeabi-v7a", "armeabi"],
        "x86_64" => &["x86_64", "x86"],
        "x86" => &["x86"],
        "riscv64" => &["riscv64"],
        _ => &[],
    };
    abis.iter().map(|s| s.to_string()).collect()
}

/// Set of supported instruction set names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IsaSet {
    isas: BTreeSet<String>,
}

impl IsaSet {
    /// Build a vocabulary directly from instruction set names
    pub fn new<I, S>(isas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            isas: isas.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a vocabulary from ABI strings, dropping ones that do not resolve
    pub fn from_abis<I, S>(abis: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut isas = BTreeSet::new();
        for abi in abis {
            match instruction_set_for_abi(abi.as_ref()) {
                Some(isa) => {
                    isas.insert(isa.to_string());
                }
                None => warn!("Ignoring unknown ABI: {}", abi.as_ref()),
            }
        }
        Self { isas }
    }

    /// Vocabulary for the host architecture
    pub fn host() -> Self {
        Self::from_abis(host_abis())
    }

    pub fn contains(&self, isa: &str) -> bool {
        self.isas.contains(isa)
    }

    pub fn is_empty(&self) -> bool {
        self.isas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.isas.iter().map(String::as_str)
    }
}

impl fmt::Display for IsaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{}", names.join(","))
    }
}
