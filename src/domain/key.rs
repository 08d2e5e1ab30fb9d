//! Dependency keys: what a node in a dependency graph stands for.

use std::fmt;
use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::domain::semantic::DefinedEntity;

/// Kind of entity a key describes. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    TopLevel,
    Nominal,
    PotentialMember,
    Member,
    DynamicLookup,
    ExternalDepend,
    SourceFileProvide,
}

impl NodeKind {
    pub const ALL: [NodeKind; 7] = [
        NodeKind::TopLevel,
        NodeKind::Nominal,
        NodeKind::PotentialMember,
        NodeKind::Member,
        NodeKind::DynamicLookup,
        NodeKind::ExternalDepend,
        NodeKind::SourceFileProvide,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::TopLevel => "topLevel",
            NodeKind::Nominal => "nominal",
            NodeKind::PotentialMember => "potentialMember",
            NodeKind::Member => "member",
            NodeKind::DynamicLookup => "dynamicLookup",
            NodeKind::ExternalDepend => "externalDepend",
            NodeKind::SourceFileProvide => "sourceFileProvide",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclAspect {
    Interface,
    Implementation,
}

impl DeclAspect {
    pub const ALL: [DeclAspect; 2] = [DeclAspect::Interface, DeclAspect::Implementation];

    pub fn name(self) -> &'static str {
        match self {
            DeclAspect::Interface => "interface",
            DeclAspect::Implementation => "implementation",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            DeclAspect::Interface => DeclAspect::Implementation,
            DeclAspect::Implementation => DeclAspect::Interface,
        }
    }
}

/// Identifies a graph node. Two keys are equal iff all four components are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DependencyKey {
    pub kind: NodeKind,
    pub aspect: DeclAspect,
    pub context: String,
    pub name: String,
}

impl DependencyKey {
    pub fn new(
        kind: NodeKind,
        aspect: DeclAspect,
        context: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            aspect,
            context: context.into(),
            name: name.into(),
        }
    }

    pub fn builder(kind: NodeKind, aspect: DeclAspect) -> DependencyKeyBuilder {
        DependencyKeyBuilder {
            kind,
            aspect,
            context: String::new(),
            name: String::new(),
        }
    }

    /// Key of the node anchoring everything one file provides.
    pub fn for_whole_source_file(aspect: DeclAspect, deps_name: &str) -> Self {
        Self::builder(NodeKind::SourceFileProvide, aspect)
            .with_raw_name(deps_name)
            .build()
    }

    /// Key of a dependency on a separately compiled artifact. Always an interface.
    pub fn for_external_dependency(path: &str) -> Self {
        Self::builder(NodeKind::ExternalDepend, DeclAspect::Interface)
            .with_raw_name(path)
            .build()
    }

    pub fn is_interface(&self) -> bool {
        self.aspect == DeclAspect::Interface
    }

    pub fn is_implementation(&self) -> bool {
        self.aspect == DeclAspect::Implementation
    }

    fn with_aspect(&self, aspect: DeclAspect) -> Self {
        Self {
            aspect,
            ..self.clone()
        }
    }

    pub fn corresponding_implementation(&self) -> Self {
        self.with_aspect(DeclAspect::Implementation)
    }

    pub fn corresponding_interface(&self) -> Self {
        self.with_aspect(DeclAspect::Interface)
    }

    /// The deps file name stored in a `sourceFileProvide` key.
    pub fn deps_name_from_source_file_provide_key(&self) -> Option<&str> {
        (self.kind == NodeKind::SourceFileProvide).then_some(self.name.as_str())
    }

    pub fn human_readable_name(&self) -> String {
        match self.kind {
            NodeKind::Member => format!("{}.{}", self.context, self.name),
            NodeKind::ExternalDepend | NodeKind::SourceFileProvide => Path::new(&self.name)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.name.clone()),
            NodeKind::PotentialMember => format!("{}.*", self.context),
            NodeKind::Nominal => self.context.clone(),
            NodeKind::TopLevel | NodeKind::DynamicLookup => self.name.clone(),
        }
    }

    /// Checks the component-presence rules for this key's kind.
    pub fn verify(&self) -> Result<()> {
        if self.kind == NodeKind::ExternalDepend && !self.is_interface() {
            bail!("external dependency {} must be an interface", self);
        }
        let has_context = !self.context.is_empty();
        let has_name = !self.name.is_empty();
        match self.kind {
            NodeKind::TopLevel
            | NodeKind::DynamicLookup
            | NodeKind::ExternalDepend
            | NodeKind::SourceFileProvide => {
                if has_context || !has_name {
                    bail!("key {:?} must only have a name", self);
                }
            }
            NodeKind::Nominal | NodeKind::PotentialMember => {
                if !has_context || has_name {
                    bail!("key {:?} must only have a context", self);
                }
            }
            NodeKind::Member => {
                if !has_context || !has_name {
                    bail!("key {:?} must have both a context and a name", self);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} aspect: {}, {}",
            self.kind.name(),
            self.aspect.name(),
            self.human_readable_name()
        )
    }
}

/// Builds a [`DependencyKey`], extracting context and name according to the key's kind.
#[derive(Debug, Clone)]
pub struct DependencyKeyBuilder {
    kind: NodeKind,
    aspect: DeclAspect,
    context: String,
    name: String,
}

impl DependencyKeyBuilder {
    /// Nominal and potential-member keys carry the nominal's mangled name here, with an empty
    /// name; member keys carry it here alongside the member's name.
    pub fn with_context(mut self, entity: &DefinedEntity) -> Self {
        self.context = match (self.kind, entity) {
            (NodeKind::Nominal | NodeKind::PotentialMember, DefinedEntity::Standalone(decl)) => {
                decl.nominal_context_name().to_string()
            }
            (NodeKind::Member, DefinedEntity::Member { nominal, .. }) => {
                nominal.nominal_context_name().to_string()
            }
            (NodeKind::Nominal | NodeKind::PotentialMember, DefinedEntity::Member { nominal, .. }) => {
                nominal.nominal_context_name().to_string()
            }
            _ => String::new(),
        };
        self
    }

    pub fn with_name(mut self, entity: &DefinedEntity) -> Self {
        self.name = match (self.kind, entity) {
            (NodeKind::TopLevel | NodeKind::DynamicLookup, DefinedEntity::Standalone(decl)) => {
                decl.name.clone()
            }
            (NodeKind::TopLevel | NodeKind::DynamicLookup, DefinedEntity::Member { member, .. }) => {
                member.name.clone()
            }
            (NodeKind::Member, DefinedEntity::Member { member, .. }) => member.name.clone(),
            _ => String::new(),
        };
        self
    }

    pub fn with_raw_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_raw_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn build(self) -> DependencyKey {
        DependencyKey {
            kind: self.kind,
            aspect: self.aspect,
            context: self.context,
            name: self.name,
        }
    }
}
