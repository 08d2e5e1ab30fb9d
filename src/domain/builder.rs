//! Construction of one file's dependency graph from injected declaration and use enumerators.

use crate::domain::diagnostics::DiagnosticEngine;
use crate::domain::fingerprint::Fingerprint;
use crate::domain::graph::SourceFileDepGraph;
use crate::domain::key::{DeclAspect, DependencyKey, NodeKind};
use crate::domain::node::NodePair;
use crate::domain::ports::{DeclEnumerator, OutputBackend, UseEnumerator};
use crate::domain::semantic::{DefinedEntity, fingerprint_of};
use petgraph::graph::NodeIndex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Per-artifact inputs of the factory.
#[derive(Debug, Clone)]
pub struct FactoryOptions {
    /// Declaration information may be incomplete; fingerprints supplied by the hooks are dropped.
    pub had_compilation_error: bool,
    /// Name of the deps file being produced; labels the per-file node.
    pub deps_name: String,
    /// Fingerprint of the whole file.
    pub file_fingerprint: Fingerprint,
    /// Where the deps file is written. Defaults to `deps_name`.
    pub output_path: Option<PathBuf>,
    /// Also write `<output path>.dot` after construction.
    pub emit_dot_file_after_construction: bool,
}

impl FactoryOptions {
    pub fn new(deps_name: impl Into<String>, file_fingerprint: Fingerprint) -> Self {
        Self {
            had_compilation_error: false,
            deps_name: deps_name.into(),
            file_fingerprint,
            output_path: None,
            emit_dot_file_after_construction: false,
        }
    }

    pub fn with_compilation_error(mut self, had_compilation_error: bool) -> Self {
        self.had_compilation_error = had_compilation_error;
        self
    }

    pub fn with_dot_file(mut self, emit: bool) -> Self {
        self.emit_dot_file_after_construction = emit;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// The deps file path with `.dot` appended.
    pub fn dot_file_path(&self) -> PathBuf {
        let base = self
            .output_path
            .as_deref()
            .unwrap_or_else(|| Path::new(&self.deps_name));
        let mut path = OsString::from(base.as_os_str());
        path.push(".dot");
        PathBuf::from(path)
    }
}

/// Builds the [`SourceFileDepGraph`] of exactly one source file or module.
///
/// `construct` consumes the factory, so a factory can be used once.
pub struct SourceFileDepGraphFactory<'a> {
    options: FactoryOptions,
    diags: &'a mut DiagnosticEngine,
    backend: &'a dyn OutputBackend,
    g: SourceFileDepGraph,
}

impl<'a> SourceFileDepGraphFactory<'a> {
    pub fn new(
        options: FactoryOptions,
        diags: &'a mut DiagnosticEngine,
        backend: &'a dyn OutputBackend,
    ) -> Self {
        Self {
            options,
            diags,
            backend,
            g: SourceFileDepGraph::new(),
        }
    }

    pub fn construct(
        mut self,
        defined: &dyn DeclEnumerator,
        used: &dyn UseEnumerator,
    ) -> SourceFileDepGraph {
        debug!(
            deps = %self.options.deps_name,
            had_error = self.options.had_compilation_error,
            "constructing source file dependency graph"
        );
        if self.options.deps_name.is_empty() {
            self.diags
                .error("cannot build a dependency graph without a deps file name");
            return self.g;
        }
        let drop_fingerprints = self.options.had_compilation_error;

        self.add_source_file_node_to_graph();
        defined.add_all_defined_decls(&mut DefinedDecls {
            g: &mut self.g,
            drop_fingerprints,
        });
        used.add_all_used_decls(&mut UsedDecls {
            g: &mut self.g,
            diags: &mut *self.diags,
            drop_fingerprints,
        });

        if let Err(e) = self.g.verify() {
            self.diags
                .error(format!("malformed dependency graph for {}: {:#}", self.options.deps_name, e));
        }
        if self.options.emit_dot_file_after_construction {
            self.g.emit_dot_file(
                self.backend,
                &self.options.dot_file_path(),
                &mut *self.diags,
            );
        }
        debug!(
            nodes = self.g.node_count(),
            arcs = self.g.arc_count(),
            "dependency graph constructed"
        );
        self.g
    }

    fn add_source_file_node_to_graph(&mut self) {
        let key = SourceFileDepGraph::source_file_key(&self.options.deps_name);
        self.g
            .find_existing_node_or_create_if_new(&key, Some(self.options.file_fingerprint), true);
    }
}

/// Convenience wrapper: build one graph from the two enumerators.
pub fn build_graph(
    options: FactoryOptions,
    defined: &dyn DeclEnumerator,
    used: &dyn UseEnumerator,
    diags: &mut DiagnosticEngine,
    backend: &dyn OutputBackend,
) -> SourceFileDepGraph {
    SourceFileDepGraphFactory::new(options, diags, backend).construct(defined, used)
}

/// Handle through which a [`DeclEnumerator`] adds the declarations a file provides.
pub struct DefinedDecls<'g> {
    g: &'g mut SourceFileDepGraph,
    drop_fingerprints: bool,
}

impl DefinedDecls<'_> {
    /// Adds the interface/implementation pair for `interface_key` and makes the interface
    /// depend on the per-file node.
    pub fn add_a_defined_decl(
        &mut self,
        interface_key: &DependencyKey,
        fingerprint: Option<Fingerprint>,
    ) -> Option<NodePair<NodeIndex>> {
        if interface_key.kind == NodeKind::SourceFileProvide {
            debug!(key = %interface_key, "per-file node is added by the factory");
            return None;
        }
        let interface_key = if interface_key.is_interface() {
            interface_key.clone()
        } else {
            interface_key.corresponding_interface()
        };
        let fingerprint = if self.drop_fingerprints { None } else { fingerprint };
        let pair = self
            .g
            .find_existing_node_pair_or_create_and_add_if_new(&interface_key, fingerprint);
        if let Some(source_file) = self.g.source_file_node() {
            self.g.add_arc(source_file, pair.interface);
        }
        Some(pair)
    }

    /// Adds every entity of one kind, building keys and looking up fingerprints per entity.
    pub fn add_all_defined_decls_of_a_given_type(
        &mut self,
        kind: NodeKind,
        entities: &[DefinedEntity],
    ) {
        for entity in entities {
            let fingerprint = fingerprint_of(entity);
            let key = DependencyKey::builder(kind, DeclAspect::Interface)
                .with_context(entity)
                .with_name(entity)
                .build();
            self.add_a_defined_decl(&key, fingerprint);
        }
    }

    pub fn graph(&self) -> &SourceFileDepGraph {
        &*self.g
    }
}

/// Handle through which a [`UseEnumerator`] records dependencies.
pub struct UsedDecls<'g> {
    g: &'g mut SourceFileDepGraph,
    diags: &'g mut DiagnosticEngine,
    drop_fingerprints: bool,
}

impl UsedDecls<'_> {
    /// `use_key` depends on `def_key`; `def_key` gets a placeholder node if not defined here.
    pub fn add_a_used_decl(&mut self, def_key: &DependencyKey, use_key: &DependencyKey) {
        let def = self.g.find_existing_node_or_create_if_new(def_key, None, false);
        self.link_use(def, use_key);
    }

    /// Like [`add_a_used_decl`](Self::add_a_used_decl) for a declaration from another module.
    /// The fingerprint, if any, is attached to the def node when it is created.
    pub fn add_an_external_dependency(
        &mut self,
        def_key: &DependencyKey,
        use_key: &DependencyKey,
        fingerprint: Option<Fingerprint>,
    ) {
        let fingerprint = if self.drop_fingerprints { None } else { fingerprint };
        let def = self
            .g
            .find_existing_node_or_create_if_new(def_key, fingerprint, false);
        self.link_use(def, use_key);
    }

    fn link_use(&mut self, def: NodeIndex, use_key: &DependencyKey) {
        let use_node = match self.g.find_existing_node(use_key) {
            Some(idx) => {
                if !self.g.node(idx).is_provides {
                    warn!(key = %use_key, "using node is not a provides node");
                }
                idx
            }
            None => {
                self.diags.warning(format!(
                    "use {} was never defined in this file; treating it as always changed",
                    use_key
                ));
                self.g.find_existing_node_or_create_if_new(use_key, None, true)
            }
        };
        self.g.add_arc(def, use_node);
    }

    pub fn graph(&self) -> &SourceFileDepGraph {
        &*self.g
    }

    /// Sink for problems found in the use records themselves.
    pub fn diagnostics(&mut self) -> &mut DiagnosticEngine {
        &mut *self.diags
    }
}

/// Enumerator that contributes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDecls;

impl DeclEnumerator for NoDecls {
    fn add_all_defined_decls(&self, _decls: &mut DefinedDecls<'_>) {}
}

impl UseEnumerator for NoDecls {
    fn add_all_used_decls(&self, _uses: &mut UsedDecls<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    struct NullOutputBackend;

    impl OutputBackend for NullOutputBackend {
        fn open_output(&self, _path: &Path) -> anyhow::Result<Box<dyn Write + '_>> {
            Ok(Box::new(std::io::sink()))
        }
    }

    fn options() -> FactoryOptions {
        FactoryOptions::new("main.deps", Fingerprint::from_content("main"))
    }

    #[test]
    fn test_error_flag_keeps_only_source_file_node() {
        let mut diags = DiagnosticEngine::new();
        let g = build_graph(
            options().with_compilation_error(true),
            &NoDecls,
            &NoDecls,
            &mut diags,
            &NullOutputBackend,
        );
        assert_eq!(g.node_count(), 1);
        let source = g.source_file_node().unwrap();
        assert_eq!(g.node(source).key.kind, NodeKind::SourceFileProvide);
        assert_eq!(g.node(source).fingerprint, Some(Fingerprint::from_content("main")));
        assert_eq!(g.deps_name_of_producer(), Some("main.deps"));
    }

    #[test]
    fn test_error_flag_drops_decl_fingerprints() {
        let mut diags = DiagnosticEngine::new();
        let key = DependencyKey::new(NodeKind::Nominal, DeclAspect::Interface, "S", "");
        let defs = |d: &mut DefinedDecls<'_>| {
            d.add_a_defined_decl(&key, Some(Fingerprint::from_content("S")));
        };
        let g = build_graph(
            options().with_compilation_error(true),
            &defs,
            &NoDecls,
            &mut diags,
            &NullOutputBackend,
        );
        let idx = g.find_existing_node(&key).unwrap();
        assert_eq!(g.node(idx).fingerprint, None);
        assert_eq!(g.node_count(), 3);
    }

    #[test]
    fn test_empty_deps_name_is_diagnosed_not_fatal() {
        let mut diags = DiagnosticEngine::new();
        let defs = |d: &mut DefinedDecls<'_>| {
            d.add_a_defined_decl(
                &DependencyKey::new(NodeKind::TopLevel, DeclAspect::Interface, "", "f"),
                None,
            );
        };
        let g = build_graph(
            FactoryOptions::new("", Fingerprint::ZERO),
            &defs,
            &NoDecls,
            &mut diags,
            &NullOutputBackend,
        );
        assert!(g.is_empty());
        assert!(diags.had_any_error());
    }

    #[test]
    fn test_dot_file_sits_beside_output() {
        let options = options();
        assert_eq!(options.dot_file_path(), PathBuf::from("main.deps.dot"));
        let options = options.with_output_path("out/build/main.deps");
        assert_eq!(options.dot_file_path(), PathBuf::from("out/build/main.deps.dot"));
    }

    #[test]
    fn test_missing_use_is_created_and_diagnosed() {
        let mut diags = DiagnosticEngine::new();
        let def = DependencyKey::new(NodeKind::TopLevel, DeclAspect::Interface, "", "g");
        let use_key = DependencyKey::new(NodeKind::TopLevel, DeclAspect::Implementation, "", "h");
        let uses = |u: &mut UsedDecls<'_>| u.add_a_used_decl(&def, &use_key);
        let g = build_graph(options(), &NoDecls, &uses, &mut diags, &NullOutputBackend);
        let use_idx = g.find_existing_node(&use_key).unwrap();
        let def_idx = g.find_existing_node(&def).unwrap();
        assert!(g.node(use_idx).is_provides);
        assert!(g.depends_on(use_idx, def_idx));
        assert_eq!(diags.diagnostics().len(), 1);
        assert!(!diags.had_any_error());
    }
}
