//! Graph nodes.

use crate::domain::fingerprint::Fingerprint;
use crate::domain::key::{DependencyKey, NodeKind};

/// A node of a [`SourceFileDepGraph`](crate::domain::graph::SourceFileDepGraph).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFileDepGraphNode {
    pub key: DependencyKey,
    pub fingerprint: Option<Fingerprint>,
    /// Position in the graph's node arena; also the node's identity in serialized form.
    pub sequence_number: usize,
    /// Declared in this file, as opposed to a placeholder for something used here.
    pub is_provides: bool,
}

impl SourceFileDepGraphNode {
    pub fn new(
        key: DependencyKey,
        fingerprint: Option<Fingerprint>,
        is_provides: bool,
        sequence_number: usize,
    ) -> Self {
        Self {
            key,
            fingerprint,
            sequence_number,
            is_provides,
        }
    }

    pub fn human_readable_name(&self, location: &str) -> String {
        let base = self.key.human_readable_name();
        if location.is_empty() || self.key.kind == NodeKind::SourceFileProvide {
            base
        } else {
            format!("{} in {}", base, location)
        }
    }

    pub fn describe(&self) -> String {
        let fingerprint = self
            .fingerprint
            .map(|fp| format!("fingerprint: {}", fp))
            .unwrap_or_else(|| "no fingerprint".to_string());
        format!(
            "{} {} sequence number: {} is provides: {}",
            self.key, fingerprint, self.sequence_number, self.is_provides
        )
    }
}

/// Interface and implementation nodes created together for one declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePair<Idx> {
    pub interface: Idx,
    pub implementation: Idx,
}
