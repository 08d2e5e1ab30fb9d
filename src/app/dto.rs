//! On-disk and report shapes for dependency graphs.
//!
//! A deps side file is a header followed by one record per node, in sequence order. Each
//! record lists the sequence numbers of the nodes it depends upon.

use crate::domain::fingerprint::Fingerprint;
use crate::domain::key::DependencyKey;
use serde::{Deserialize, Serialize};

/// Every deps file starts with this signature, for easy identification when debugging.
pub const FORMAT_SIGNATURE: &str = "DEPS";
pub const FORMAT_VERSION_MAJOR: u16 = 1;
/// Increment on every change.
pub const FORMAT_VERSION_MINOR: u16 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatHeader {
    pub signature: String,
    pub major: u16,
    pub minor: u16,
    pub compiler_version: String,
}

impl Default for FormatHeader {
    fn default() -> Self {
        Self {
            signature: FORMAT_SIGNATURE.to_string(),
            major: FORMAT_VERSION_MAJOR,
            minor: FORMAT_VERSION_MINOR,
            compiler_version: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub key: DependencyKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    pub sequence_number: usize,
    #[serde(default)]
    pub defs_i_depend_upon: Vec<usize>,
    pub is_provides: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub header: FormatHeader,
    pub nodes: Vec<SerializedNode>,
}

/// Node-level differences between two graphs of the same file, keyed by dependency key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDiff {
    pub added: Vec<DependencyKey>,
    pub removed: Vec<DependencyKey>,
    pub fingerprint_changed: Vec<FingerprintChange>,
}

impl GraphDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.fingerprint_changed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintChange {
    pub key: DependencyKey,
    pub old: Option<Fingerprint>,
    pub new: Option<Fingerprint>,
}

/// Counts reported by `verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub deps_name: Option<String>,
    pub node_count: usize,
    pub arc_count: usize,
    pub provides_count: usize,
    pub external_count: usize,
}
