//! Declaration model handed to the graph factory by a frontend.
//!
//! Only the parts of a declaration that matter for dependency keys are kept: its name, its
//! category, the mangled name of the nominal it denotes or extends, and the fingerprint of its
//! body when it has one.

use serde::{Deserialize, Serialize};

use crate::domain::fingerprint::Fingerprint;

/// Syntactic/semantic category of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DeclKind {
    Function,
    Variable,
    Operator,
    PrecedenceGroup,
    TypeAlias,
    Struct,
    Enum,
    Class,
    Protocol,
    /// Extension of another nominal; `extended` is that nominal's mangled name.
    Extension { extended: String },
}

impl DeclKind {
    pub fn is_nominal(&self) -> bool {
        matches!(
            self,
            DeclKind::Struct | DeclKind::Enum | DeclKind::Class | DeclKind::Protocol
        )
    }

    /// Nominal types and extensions own a member list and may carry a body fingerprint.
    pub fn is_iterable_context(&self) -> bool {
        self.is_nominal() || matches!(self, DeclKind::Extension { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decl {
    pub name: String,
    #[serde(flatten)]
    pub kind: DeclKind,
    /// Mangled name for nominal types. Falls back to `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mangled_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_fingerprint: Option<Fingerprint>,
}

impl Decl {
    pub fn new(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            mangled_name: None,
            body_fingerprint: None,
        }
    }

    pub fn with_mangled_name(mut self, mangled: impl Into<String>) -> Self {
        self.mangled_name = Some(mangled.into());
        self
    }

    pub fn with_body_fingerprint(mut self, fingerprint: Fingerprint) -> Self {
        self.body_fingerprint = Some(fingerprint);
        self
    }

    /// Canonical name of the nominal this declaration denotes or extends.
    pub fn nominal_context_name(&self) -> &str {
        match &self.kind {
            DeclKind::Extension { extended } => extended,
            _ => self.mangled_name.as_deref().unwrap_or(&self.name),
        }
    }
}

/// Something defined in a file: a standalone declaration, or a member seen through its nominal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinedEntity {
    Standalone(Decl),
    Member { nominal: Decl, member: Decl },
}

impl DefinedEntity {
    pub fn member(nominal: Decl, member: Decl) -> Self {
        DefinedEntity::Member { nominal, member }
    }
}

impl From<Decl> for DefinedEntity {
    fn from(decl: Decl) -> Self {
        DefinedEntity::Standalone(decl)
    }
}

/// Fingerprint policy for defined entities.
///
/// Members never get a fingerprint of their own: any change to a nominal's member set
/// invalidates that whole context.
pub fn fingerprint_of(entity: &DefinedEntity) -> Option<Fingerprint> {
    match entity {
        DefinedEntity::Standalone(decl) if decl.kind.is_iterable_context() => decl.body_fingerprint,
        DefinedEntity::Standalone(_) => None,
        DefinedEntity::Member { .. } => None,
    }
}
