//! Graphviz rendering of a [`SourceFileDepGraph`], for human inspection only.

use crate::domain::graph::SourceFileDepGraph;
use crate::domain::key::NodeKind;
use crate::domain::node::SourceFileDepGraphNode;
use std::collections::BTreeSet;
use std::io::{self, Write};

/// Emits nodes in sequence order and arcs sorted by (def, use), so output is reproducible.
pub struct DotFileEmitter<'g> {
    graph: &'g SourceFileDepGraph,
    include_externals: bool,
    include_implementations: bool,
}

impl<'g> DotFileEmitter<'g> {
    pub fn new(graph: &'g SourceFileDepGraph) -> Self {
        Self {
            graph,
            include_externals: true,
            include_implementations: true,
        }
    }

    pub fn include_externals(mut self, include: bool) -> Self {
        self.include_externals = include;
        self
    }

    pub fn include_implementations(mut self, include: bool) -> Self {
        self.include_implementations = include;
        self
    }

    fn is_shown(&self, node: &SourceFileDepGraphNode) -> bool {
        (self.include_externals || node.key.kind != NodeKind::ExternalDepend)
            && (self.include_implementations || node.key.is_interface())
    }

    pub fn emit<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let title = self.graph.deps_name_of_producer().unwrap_or("dependencies");
        writeln!(out, "digraph \"{}\" {{", escape(title))?;

        let mut shown = BTreeSet::new();
        for idx in self.graph.node_indices() {
            let node = self.graph.node(idx);
            if !self.is_shown(node) {
                continue;
            }
            shown.insert(idx);
            writeln!(
                out,
                "  {} [label=\"{}\", shape={}, style={}];",
                node.sequence_number,
                escape(&label(node)),
                shape(node.key.kind),
                if node.is_provides { "solid" } else { "dotted" },
            )?;
        }

        let mut arcs = BTreeSet::new();
        for &use_idx in &shown {
            for def_idx in self.graph.defs_depended_upon_by(use_idx) {
                if shown.contains(&def_idx) {
                    arcs.insert((def_idx.index(), use_idx.index()));
                }
            }
        }
        for (def, use_node) in arcs {
            writeln!(out, "  {} -> {};", def, use_node)?;
        }
        writeln!(out, "}}")
    }
}

fn label(node: &SourceFileDepGraphNode) -> String {
    let mut label = format!(
        "{} {}",
        node.key.aspect.name(),
        node.key.human_readable_name()
    );
    if let Some(fp) = node.fingerprint {
        label.push_str(&format!("\\n{}", fp));
    }
    label
}

fn shape(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::TopLevel => "ellipse",
        NodeKind::Nominal => "box",
        NodeKind::PotentialMember => "diamond",
        NodeKind::Member => "parallelogram",
        NodeKind::DynamicLookup => "hexagon",
        NodeKind::ExternalDepend => "folder",
        NodeKind::SourceFileProvide => "note",
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
