use crate::app::dto::{
    FORMAT_SIGNATURE, FORMAT_VERSION_MAJOR, FingerprintChange, FormatHeader, GraphDiff,
    GraphSummary, SerializedGraph, SerializedNode,
};
use crate::domain::diagnostics::DiagnosticEngine;
use crate::domain::graph::SourceFileDepGraph;
use crate::domain::key::NodeKind;
use crate::domain::node::SourceFileDepGraphNode;
use crate::domain::ports::OutputBackend;
use anyhow::{Context as _, Result, bail};
use memmap2::Mmap;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Leading comment of YAML dumps.
pub const YAML_BANNER: &str = "# Fine-grained v0\n";

pub fn to_serialized(g: &SourceFileDepGraph) -> SerializedGraph {
    let mut nodes = Vec::with_capacity(g.node_count());
    g.for_each_node(|idx, node| {
        nodes.push(SerializedNode {
            key: node.key.clone(),
            fingerprint: node.fingerprint,
            sequence_number: node.sequence_number,
            defs_i_depend_upon: g
                .defs_depended_upon_by(idx)
                .into_iter()
                .map(|def| def.index())
                .collect(),
            is_provides: node.is_provides,
        });
    });
    SerializedGraph {
        header: FormatHeader::default(),
        nodes,
    }
}

pub fn from_serialized(serialized: SerializedGraph) -> Result<SourceFileDepGraph> {
    let header = &serialized.header;
    if header.signature != FORMAT_SIGNATURE {
        bail!("not a deps file: signature is '{}'", header.signature);
    }
    if header.major != FORMAT_VERSION_MAJOR {
        bail!(
            "unsupported deps format version {}.{} (expected major {})",
            header.major,
            header.minor,
            FORMAT_VERSION_MAJOR
        );
    }
    let mut arcs = Vec::new();
    let mut nodes = Vec::with_capacity(serialized.nodes.len());
    for record in serialized.nodes {
        arcs.extend(
            record
                .defs_i_depend_upon
                .iter()
                .map(|&def| (def, record.sequence_number)),
        );
        nodes.push(SourceFileDepGraphNode::new(
            record.key,
            record.fingerprint,
            record.is_provides,
            record.sequence_number,
        ));
    }
    SourceFileDepGraph::from_parts(nodes, arcs)
}

pub fn to_json(g: &SourceFileDepGraph) -> Result<String> {
    serde_json::to_string_pretty(&to_serialized(g)).context("Failed to serialize graph as JSON")
}

pub fn to_yaml(g: &SourceFileDepGraph) -> Result<String> {
    let body =
        serde_yaml::to_string(&to_serialized(g)).context("Failed to serialize graph as YAML")?;
    Ok(format!("{}{}", YAML_BANNER, body))
}

pub fn from_yaml(text: &str) -> Result<SourceFileDepGraph> {
    let serialized: SerializedGraph =
        serde_yaml::from_str(text).context("Failed to parse YAML deps")?;
    from_serialized(serialized)
}

/// Parses a JSON deps file from memory.
pub fn load_from_buffer(buffer: &[u8]) -> Result<SourceFileDepGraph> {
    let serialized: SerializedGraph =
        serde_json::from_slice(buffer).context("Failed to parse deps JSON")?;
    from_serialized(serialized)
}

/// Loads a deps file; `.yaml`/`.yml` files are read as YAML, anything else as JSON.
pub fn load_from_path(path: &Path) -> Result<SourceFileDepGraph> {
    let file =
        File::open(path).with_context(|| format!("Failed to open deps file: {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat deps file: {}", path.display()))?
        .len();
    if len == 0 {
        bail!("deps file is empty: {}", path.display());
    }
    // SAFETY: the mapping is read-only and dropped before returning.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map deps file: {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let graph = if is_yaml {
        let text = std::str::from_utf8(&mmap)
            .with_context(|| format!("YAML deps file is not UTF-8: {}", path.display()))?;
        from_yaml(text)
    } else {
        load_from_buffer(&mmap)
    }
    .with_context(|| format!("Failed to load deps file: {}", path.display()))?;
    debug!(path = %path.display(), nodes = graph.node_count(), "loaded dependency graph");
    Ok(graph)
}

/// Writes the JSON side file. Failures are reported to `diags` and returned.
pub fn write_to_path(
    diags: &mut DiagnosticEngine,
    backend: &dyn OutputBackend,
    path: &Path,
    g: &SourceFileDepGraph,
) -> Result<()> {
    let result = to_json(g).and_then(|json| {
        let mut out = backend.open_output(path)?;
        out.write_all(json.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    });
    if let Err(e) = &result {
        diags.error(format!(
            "error opening '{}' for output: {:#}",
            path.display(),
            e
        ));
    }
    result
}

/// Re-reads `path` and checks it matches `g` node for node.
pub fn verify_reads_what_is_written(g: &SourceFileDepGraph, path: &Path) -> Result<()> {
    let loaded = load_from_path(path)?;
    g.verify_same(&loaded)
        .with_context(|| format!("{} does not read back as written", path.display()))
}

pub fn summarize(g: &SourceFileDepGraph) -> GraphSummary {
    let mut provides_count = 0;
    let mut external_count = 0;
    g.for_each_node(|_, node| {
        if node.is_provides {
            provides_count += 1;
        }
        if node.key.kind == NodeKind::ExternalDepend {
            external_count += 1;
        }
    });
    GraphSummary {
        deps_name: g.deps_name_of_producer().map(str::to_string),
        node_count: g.node_count(),
        arc_count: g.arc_count(),
        provides_count,
        external_count,
    }
}

/// One line per node, followed by its dependencies.
pub fn dump(g: &SourceFileDepGraph) -> String {
    let mut out = String::new();
    g.for_each_node(|idx, node| {
        out.push_str(&node.describe());
        out.push_str(" depends on:");
        for def in g.defs_depended_upon_by(idx) {
            out.push_str(&format!(" {}", def.index()));
        }
        out.push('\n');
    });
    out
}

/// Compares two graphs of the same file by key.
pub fn diff_graphs(old: &SourceFileDepGraph, new: &SourceFileDepGraph) -> GraphDiff {
    let index = |g: &SourceFileDepGraph| {
        let mut by_key = BTreeMap::new();
        g.for_each_node(|_, node| {
            by_key.insert(node.key.clone(), node.fingerprint);
        });
        by_key
    };
    let old_nodes = index(old);
    let new_nodes = index(new);
    if old.deps_name_of_producer() != new.deps_name_of_producer() {
        warn!(
            old = ?old.deps_name_of_producer(),
            new = ?new.deps_name_of_producer(),
            "comparing graphs produced for different files"
        );
    }

    let mut diff = GraphDiff::default();
    for (key, old_fp) in &old_nodes {
        match new_nodes.get(key) {
            None => diff.removed.push(key.clone()),
            Some(new_fp) if new_fp != old_fp => {
                diff.fingerprint_changed.push(FingerprintChange {
                    key: key.clone(),
                    old: *old_fp,
                    new: *new_fp,
                });
            }
            Some(_) => {}
        }
    }
    diff.added = new_nodes
        .keys()
        .filter(|key| !old_nodes.contains_key(*key))
        .cloned()
        .collect();
    diff
}
