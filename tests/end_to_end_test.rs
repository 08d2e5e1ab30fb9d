//! Manifest -> graph -> side file -> graph, plus conversions and diffs.

mod common;

use common::fixtures::{external, nominal_key, simple_manifest, structure, top_level_key};
use fine_grained_deps::adapters::fs::backend::{NullOutputBackend, OnDiskOutputBackend};
use fine_grained_deps::adapters::manifest::{FileManifest, JsonManifestSource, UseRecord};
use fine_grained_deps::app::engine;
use fine_grained_deps::domain::builder::build_graph;
use fine_grained_deps::domain::diagnostics::DiagnosticEngine;
use fine_grained_deps::domain::fingerprint::Fingerprint;
use fine_grained_deps::domain::graph::SourceFileDepGraph;
use fine_grained_deps::domain::key::{DeclAspect, DependencyKey, NodeKind};
use fine_grained_deps::domain::ports::ManifestSource;

fn build_manifest(manifest: &FileManifest, diags: &mut DiagnosticEngine) -> SourceFileDepGraph {
    let options = manifest.factory_options().unwrap();
    build_graph(options, manifest, manifest, diags, &NullOutputBackend)
}

#[test]
fn test_simple_manifest_graph_shape() {
    let mut diags = DiagnosticEngine::new();
    let g = build_manifest(&simple_manifest(), &mut diags);
    assert!(diags.diagnostics().is_empty(), "{:?}", diags.diagnostics());
    g.verify().unwrap();

    // File node, four provided pairs, one placeholder for `g`.
    assert_eq!(g.node_count(), 10);
    assert_eq!(g.arc_count(), 10);
    assert_eq!(g.deps_name_of_producer(), Some("main.deps"));

    let f_impl = g
        .find_existing_node(&top_level_key(DeclAspect::Implementation, "f"))
        .unwrap();
    let s = g
        .find_existing_node(&nominal_key(DeclAspect::Interface, "4main1SV"))
        .unwrap();
    let placeholder = g
        .find_existing_node(&top_level_key(DeclAspect::Interface, "g"))
        .unwrap();
    assert!(g.depends_on(f_impl, s));
    assert!(g.depends_on(f_impl, placeholder));
    assert!(!g.node(placeholder).is_provides);
    assert_eq!(
        g.node(s).fingerprint,
        Some(Fingerprint::from_content("struct S { func m() }"))
    );

    let potential = DependencyKey::new(
        NodeKind::PotentialMember,
        DeclAspect::Interface,
        "4main1SV",
        "",
    );
    assert!(g.find_existing_node(&potential).is_some());
}

#[test]
fn test_file_fingerprint_follows_source_text() {
    let manifest = simple_manifest();
    let fp = manifest.whole_file_fingerprint().unwrap();
    assert_eq!(
        fp,
        Fingerprint::from_content(manifest.source_text.as_deref().unwrap())
    );

    let mut explicit = manifest.clone();
    explicit.file_fingerprint = Some(Fingerprint::ZERO);
    assert_eq!(explicit.whole_file_fingerprint().unwrap(), Fingerprint::ZERO);

    let mut diags = DiagnosticEngine::new();
    let g = build_manifest(&manifest, &mut diags);
    let source = g.node(g.source_file_node().unwrap());
    assert_eq!(source.fingerprint, Some(fp));
}

#[test]
fn test_use_without_user_is_charged_to_the_file() {
    let mut manifest = FileManifest::new("main.deps");
    manifest.uses.push(UseRecord {
        def: top_level_key(DeclAspect::Interface, "print"),
        user: None,
    });
    let mut diags = DiagnosticEngine::new();
    let g = build_manifest(&manifest, &mut diags);
    let source = g.source_file_node().unwrap();
    let print = g
        .find_existing_node(&top_level_key(DeclAspect::Interface, "print"))
        .unwrap();
    assert!(g.depends_on(source, print));
    assert!(diags.diagnostics().is_empty());
}

#[test]
fn test_external_dependencies_and_malformed_records() {
    let f2 = Fingerprint::from_content("F2");
    let mut manifest = FileManifest::new("main.deps");
    manifest.external_dependencies = vec![
        external("/sdk/Foundation.swiftmodule", Some(&f2.raw_value())),
        external("/sdk/Broken.swiftmodule", Some("not-hex")),
        external("/sdk/Plain.swiftmodule", None),
    ];
    let mut diags = DiagnosticEngine::new();
    let g = build_manifest(&manifest, &mut diags);

    let foundation = g
        .find_existing_node(&DependencyKey::for_external_dependency(
            "/sdk/Foundation.swiftmodule",
        ))
        .unwrap();
    assert_eq!(g.node(foundation).fingerprint, Some(f2));
    assert!(g.depends_on(g.source_file_node().unwrap(), foundation));
    assert!(
        g.find_existing_node(&DependencyKey::for_external_dependency("/sdk/Broken.swiftmodule"))
            .is_none()
    );
    assert!(
        g.find_existing_node(&DependencyKey::for_external_dependency("/sdk/Plain.swiftmodule"))
            .is_some()
    );
    assert!(diags.had_any_error());
    assert_eq!(diags.diagnostics().len(), 1);
    assert!(diags.diagnostics()[0].message.contains("Broken"));
}

#[test]
fn test_compilation_error_manifest_keeps_structure_without_fingerprints() {
    let mut manifest = simple_manifest();
    manifest.had_compilation_error = true;
    let mut diags = DiagnosticEngine::new();
    let g = build_manifest(&manifest, &mut diags);
    assert_eq!(g.node_count(), 10);
    g.for_each_node(|_, node| {
        if node.key.kind != NodeKind::SourceFileProvide {
            assert_eq!(node.fingerprint, None, "{}", node.key);
        }
    });
    assert!(g.node(g.source_file_node().unwrap()).fingerprint.is_some());
}

#[test]
fn test_side_file_reads_back_as_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/main.deps");
    let mut diags = DiagnosticEngine::new();
    let g = build_manifest(&simple_manifest(), &mut diags);

    engine::write_to_path(&mut diags, &OnDiskOutputBackend::new(), &path, &g).unwrap();
    engine::verify_reads_what_is_written(&g, &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"DEPS\""));
    let loaded = engine::load_from_path(&path).unwrap();
    assert_eq!(loaded.arc_keys(), g.arc_keys());
}

#[test]
fn test_yaml_file_loads_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.yaml");
    let mut diags = DiagnosticEngine::new();
    let g = build_manifest(&simple_manifest(), &mut diags);
    std::fs::write(&path, engine::to_yaml(&g).unwrap()).unwrap();
    let loaded = engine::load_from_path(&path).unwrap();
    g.verify_same(&loaded).unwrap();
}

#[test]
fn test_empty_or_garbage_side_files_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty.deps");
    std::fs::write(&empty, "").unwrap();
    assert!(engine::load_from_path(&empty).is_err());

    let garbage = dir.path().join("garbage.deps");
    std::fs::write(&garbage, "{\"header\": 3}").unwrap();
    assert!(engine::load_from_path(&garbage).is_err());

    assert!(engine::load_from_path(&dir.path().join("missing.deps")).is_err());
}

#[test]
fn test_diff_after_body_change() {
    let old_manifest = simple_manifest();
    let mut new_manifest = simple_manifest();
    let changed = structure("S", "struct S { func m(); func n() }");
    new_manifest.nominals = vec![changed];

    let mut diags = DiagnosticEngine::new();
    let old = build_manifest(&old_manifest, &mut diags);
    let new = build_manifest(&new_manifest, &mut diags);
    let diff = engine::diff_graphs(&old, &new);
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
    let s = nominal_key(DeclAspect::Interface, "4main1SV");
    assert!(diff.fingerprint_changed.iter().any(|c| c.key == s));

    let summary = engine::summarize(&new);
    assert_eq!(summary.node_count, 10);
    assert_eq!(summary.provides_count, 9);
    assert_eq!(summary.external_count, 0);
}

#[test]
fn test_rebuilding_unchanged_manifest_diffs_empty() {
    let mut diags = DiagnosticEngine::new();
    let first = build_manifest(&simple_manifest(), &mut diags);
    let second = build_manifest(&simple_manifest(), &mut diags);
    first.verify_same(&second).unwrap();
    let diff = engine::diff_graphs(&first, &second);
    assert!(diff.is_empty(), "{:?}", diff);
}

#[test]
fn test_manifest_without_deps_name_is_rejected() {
    let manifest = FileManifest::new("");
    let err = manifest.factory_options().unwrap_err();
    assert!(err.to_string().contains("deps_name"));
}

#[test]
fn test_manifest_file_round_trip_through_json_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");
    let manifest = simple_manifest();
    std::fs::write(&path, serde_json::to_string_pretty(&manifest).unwrap()).unwrap();
    let loaded = JsonManifestSource::new(&path).load().unwrap();
    assert_eq!(loaded, manifest);
}
