use crate::adapters::fs::backend::OnDiskOutputBackend;
use crate::adapters::manifest::JsonManifestSource;
use crate::app::engine;
use crate::domain::builder::build_graph;
use crate::domain::diagnostics::DiagnosticEngine;
use crate::domain::dot::DotFileEmitter;
use crate::domain::ports::{ManifestSource, OutputBackend};
use anyhow::{Context as _, Result, bail};
use std::io::Write;
use std::path::Path;

/// Build a deps file from a declaration manifest and check that it reads back.
pub fn build_from_manifest(manifest_path: &Path, output: &Path, emit_dot: bool) -> Result<()> {
    let manifest = JsonManifestSource::new(manifest_path).load()?;
    let options = manifest
        .factory_options()?
        .with_output_path(output)
        .with_dot_file(emit_dot);
    let backend = OnDiskOutputBackend::new();
    let mut diags = DiagnosticEngine::new();

    let graph = build_graph(options, &manifest, &manifest, &mut diags, &backend);
    engine::write_to_path(&mut diags, &backend, output, &graph)?;
    engine::verify_reads_what_is_written(&graph, output)?;

    for diag in diags.diagnostics() {
        eprintln!("{}", diag);
    }
    let summary = engine::summarize(&graph);
    println!(
        "Wrote {} ({} nodes, {} arcs)",
        output.display(),
        summary.node_count,
        summary.arc_count
    );
    Ok(())
}

/// Convert a JSON deps file to YAML.
pub fn convert_to_yaml(input: &Path, output: &Path) -> Result<()> {
    let graph = engine::load_from_path(input)?;
    let yaml = engine::to_yaml(&graph)?;
    write_text(output, &yaml).context("Failed to write YAML deps")
}

/// Convert a YAML deps file to JSON.
pub fn convert_from_yaml(input: &Path, output: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read dependency file: {}", input.display()))?;
    let graph = engine::from_yaml(&text)?;
    let mut diags = DiagnosticEngine::new();
    engine::write_to_path(&mut diags, &OnDiskOutputBackend::new(), output, &graph)
        .context("Failed to write JSON deps")
}

pub fn dump_graph(path: &Path) -> Result<()> {
    let graph = engine::load_from_path(path)?;
    print!("{}", engine::dump(&graph));
    Ok(())
}

pub fn emit_dot(
    path: &Path,
    output: &Path,
    include_externals: bool,
    include_implementations: bool,
) -> Result<()> {
    let graph = engine::load_from_path(path)?;
    let backend = OnDiskOutputBackend::new();
    let mut out = backend.open_output(output)?;
    DotFileEmitter::new(&graph)
        .include_externals(include_externals)
        .include_implementations(include_implementations)
        .emit(&mut out)
        .with_context(|| format!("Failed to write dot file: {}", output.display()))?;
    out.flush()?;
    Ok(())
}

/// Check structural invariants and print a summary.
pub fn verify_graph(path: &Path) -> Result<()> {
    let graph = engine::load_from_path(path)?;
    graph
        .verify()
        .with_context(|| format!("{} is not a valid dependency graph", path.display()))?;
    println!("{}", serde_json::to_string_pretty(&engine::summarize(&graph))?);
    Ok(())
}

/// Print the differences between two graphs; fails when `fail_on_change` and they differ.
pub fn diff(old: &Path, new: &Path, fail_on_change: bool) -> Result<()> {
    let old_graph = engine::load_from_path(old)?;
    let new_graph = engine::load_from_path(new)?;
    let diff = engine::diff_graphs(&old_graph, &new_graph);
    println!("{}", serde_json::to_string_pretty(&diff)?);
    if fail_on_change && !diff.is_empty() {
        bail!(
            "graphs differ: {} added, {} removed, {} changed",
            diff.added.len(),
            diff.removed.len(),
            diff.fingerprint_changed.len()
        );
    }
    Ok(())
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    let backend = OnDiskOutputBackend::new();
    let mut out = backend.open_output(path)?;
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}
