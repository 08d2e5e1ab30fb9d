//! The per-file dependency graph: an arena of keyed nodes with def -> use arcs.

use crate::domain::diagnostics::DiagnosticEngine;
use crate::domain::dot::DotFileEmitter;
use crate::domain::fingerprint::Fingerprint;
use crate::domain::key::{DeclAspect, DependencyKey, NodeKind};
use crate::domain::node::{NodePair, SourceFileDepGraphNode};
use crate::domain::ports::OutputBackend;
use anyhow::{Result, bail};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Sequence number of the per-file `sourceFileProvide` node.
pub const SOURCE_FILE_PROVIDES_SEQUENCE_NUMBER: usize = 0;

/// Per-file fine-grained dependency graph.
///
/// Nodes live in an arena (`petgraph` indices double as sequence numbers). An arc `def -> use`
/// records that `use` depends on `def`; invalidation flows along arcs.
#[derive(Debug, Clone, Default)]
pub struct SourceFileDepGraph {
    graph: DiGraph<SourceFileDepGraphNode, ()>,
    memoized_nodes: HashMap<DependencyKey, NodeIndex>,
}

impl SourceFileDepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn arc_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, idx: NodeIndex) -> &SourceFileDepGraphNode {
        &self.graph[idx]
    }

    pub fn get_node(&self, sequence_number: usize) -> Option<&SourceFileDepGraphNode> {
        self.graph.node_weight(NodeIndex::new(sequence_number))
    }

    /// The per-file node, present once construction has started.
    pub fn source_file_node(&self) -> Option<NodeIndex> {
        let idx = NodeIndex::new(SOURCE_FILE_PROVIDES_SEQUENCE_NUMBER);
        self.graph
            .node_weight(idx)
            .filter(|n| n.key.kind == NodeKind::SourceFileProvide)
            .map(|_| idx)
    }

    /// Name of the deps file of the job that produced this graph.
    pub fn deps_name_of_producer(&self) -> Option<&str> {
        self.source_file_node()
            .and_then(|idx| self.graph[idx].key.deps_name_from_source_file_provide_key())
    }

    pub fn find_existing_node(&self, key: &DependencyKey) -> Option<NodeIndex> {
        self.memoized_nodes.get(key).copied()
    }

    /// Appends a node, keeping the sequence number in sync with its index.
    fn add_node(
        &mut self,
        key: DependencyKey,
        fingerprint: Option<Fingerprint>,
        is_provides: bool,
    ) -> NodeIndex {
        let sequence_number = self.graph.node_count();
        let idx = self.graph.add_node(SourceFileDepGraphNode::new(
            key.clone(),
            fingerprint,
            is_provides,
            sequence_number,
        ));
        self.memoized_nodes.insert(key, idx);
        idx
    }

    /// Upsert by key.
    ///
    /// A placeholder that is later provided with a fingerprint becomes a provides node carrying
    /// it. Two provides of one key that disagree on the fingerprint keep none.
    pub fn find_existing_node_or_create_if_new(
        &mut self,
        key: &DependencyKey,
        fingerprint: Option<Fingerprint>,
        is_provides: bool,
    ) -> NodeIndex {
        let Some(idx) = self.find_existing_node(key) else {
            return self.add_node(key.clone(), fingerprint, is_provides);
        };
        if !is_provides {
            return idx;
        }
        let node = &mut self.graph[idx];
        if !node.is_provides && fingerprint.is_some() {
            debug_assert!(node.fingerprint.is_none(), "depends should not have fingerprints");
            node.is_provides = true;
            node.fingerprint = fingerprint;
            return idx;
        }
        node.is_provides = true;
        if fingerprint != node.fingerprint {
            debug!(key = %key, "conflicting fingerprints, dropping both");
            node.fingerprint = None;
        }
        idx
    }

    /// Creates (or finds) the interface/implementation pair for a provided declaration.
    ///
    /// The implementation node depends on the interface node and never has a fingerprint.
    pub fn find_existing_node_pair_or_create_and_add_if_new(
        &mut self,
        interface_key: &DependencyKey,
        fingerprint: Option<Fingerprint>,
    ) -> NodePair<NodeIndex> {
        debug_assert!(interface_key.is_interface());
        let interface = self.find_existing_node_or_create_if_new(interface_key, fingerprint, true);
        let implementation = self.find_existing_node_or_create_if_new(
            &interface_key.corresponding_implementation(),
            None,
            true,
        );
        self.add_arc(interface, implementation);
        NodePair {
            interface,
            implementation,
        }
    }

    /// Records that `use_node` depends on `def`. Duplicate and reflexive arcs are ignored.
    pub fn add_arc(&mut self, def: NodeIndex, use_node: NodeIndex) {
        if def == use_node {
            return;
        }
        self.graph.update_edge(def, use_node, ());
    }

    pub fn depends_on(&self, use_node: NodeIndex, def: NodeIndex) -> bool {
        self.graph.contains_edge(def, use_node)
    }

    /// Defs `use_node` depends upon, in sequence order.
    pub fn defs_depended_upon_by(&self, use_node: NodeIndex) -> Vec<NodeIndex> {
        let defs: BTreeSet<NodeIndex> = self
            .graph
            .neighbors_directed(use_node, Direction::Incoming)
            .collect();
        defs.into_iter().collect()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn for_each_node(&self, mut f: impl FnMut(NodeIndex, &SourceFileDepGraphNode)) {
        for idx in self.graph.node_indices() {
            f(idx, &self.graph[idx]);
        }
    }

    /// Visits arcs as `(def, use)`, ordered by use then def sequence number.
    pub fn for_each_arc(&self, mut f: impl FnMut(&SourceFileDepGraphNode, &SourceFileDepGraphNode)) {
        for use_idx in self.graph.node_indices() {
            for def_idx in self.defs_depended_upon_by(use_idx) {
                f(&self.graph[def_idx], &self.graph[use_idx]);
            }
        }
    }

    /// Every node whose freshness depends, directly or transitively, on `start`.
    pub fn reachable_from(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut bfs = Bfs::new(&self.graph, start);
        let mut reached = Vec::new();
        while let Some(idx) = bfs.next(&self.graph) {
            reached.push(idx);
        }
        reached
    }

    /// All arcs as `(def key, use key)` pairs.
    pub fn arc_keys(&self) -> BTreeSet<(DependencyKey, DependencyKey)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.graph[e.source()].key.clone(),
                    self.graph[e.target()].key.clone(),
                )
            })
            .collect()
    }

    /// Structural checks: one node per key, sequence numbers match positions, valid keys,
    /// irreflexive arcs.
    pub fn verify(&self) -> Result<()> {
        let mut seen: HashMap<&DependencyKey, usize> = HashMap::new();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            if node.sequence_number != idx.index() {
                bail!(
                    "bad sequence number {} for node at position {}",
                    node.sequence_number,
                    idx.index()
                );
            }
            if let Some(previous) = seen.insert(&node.key, node.sequence_number) {
                bail!(
                    "duplicate frontend keys: node {} and node {} are both {}",
                    previous,
                    node.sequence_number,
                    node.key
                );
            }
            node.key.verify()?;
            if node.key.is_implementation() && node.fingerprint.is_some() {
                bail!("implementation node {} carries a fingerprint", node.key);
            }
        }
        for edge in self.graph.edge_references() {
            if edge.source() == edge.target() {
                bail!("uses should be irreflexive: {}", self.graph[edge.source()].key);
            }
        }
        if self.memoized_nodes.len() != self.graph.node_count() {
            bail!(
                "key index holds {} entries for {} nodes",
                self.memoized_nodes.len(),
                self.graph.node_count()
            );
        }
        Ok(())
    }

    /// Checks that `other` has the same nodes, in the same order, with the same arcs.
    pub fn verify_same(&self, other: &SourceFileDepGraph) -> Result<()> {
        if self.node_count() != other.node_count() {
            bail!(
                "both graphs must have the same number of nodes: {} vs {}",
                self.node_count(),
                other.node_count()
            );
        }
        for idx in self.graph.node_indices() {
            if self.graph[idx] != other.graph[idx] {
                bail!(
                    "graphs differ at node {}: {} vs {}",
                    idx.index(),
                    self.graph[idx].describe(),
                    other.graph[idx].describe()
                );
            }
            if self.defs_depended_upon_by(idx) != other.defs_depended_upon_by(idx) {
                bail!("graphs differ in the dependencies of {}", self.graph[idx].key);
            }
        }
        Ok(())
    }

    /// Writes the dot rendering to `path`. Failures become diagnostics; they never fail the
    /// caller.
    pub fn emit_dot_file(
        &self,
        backend: &dyn OutputBackend,
        path: &Path,
        diags: &mut DiagnosticEngine,
    ) {
        let result = backend.open_output(path).and_then(|mut out| {
            DotFileEmitter::new(self).emit(&mut out)?;
            out.flush()?;
            Ok(())
        });
        if let Err(e) = result {
            diags.error(format!(
                "error opening '{}' for output: {:#}",
                path.display(),
                e
            ));
        }
    }

    /// Reconstructs a graph from already-numbered nodes and `(def, use)` sequence-number arcs.
    pub(crate) fn from_parts(
        nodes: Vec<SourceFileDepGraphNode>,
        arcs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self> {
        let mut g = Self::new();
        for (position, node) in nodes.into_iter().enumerate() {
            if node.sequence_number != position {
                bail!(
                    "node at position {} has sequence number {}",
                    position,
                    node.sequence_number
                );
            }
            if g.memoized_nodes.contains_key(&node.key) {
                bail!("duplicate key {}", node.key);
            }
            g.add_node(node.key, node.fingerprint, node.is_provides);
        }
        let count = g.node_count();
        for (def, use_node) in arcs {
            if def >= count || use_node >= count {
                bail!("arc {} -> {} refers to a missing node", def, use_node);
            }
            if def == use_node {
                bail!("node {} depends on itself", def);
            }
            g.add_arc(NodeIndex::new(def), NodeIndex::new(use_node));
        }
        Ok(g)
    }

    /// Key of the interface node for a whole source file with the given deps name.
    pub fn source_file_key(deps_name: &str) -> DependencyKey {
        DependencyKey::for_whole_source_file(DeclAspect::Interface, deps_name)
    }
}
