use crate::domain::builder::{DefinedDecls, FactoryOptions, UsedDecls};
use crate::domain::fingerprint::Fingerprint;
use crate::domain::graph::SourceFileDepGraph;
use crate::domain::key::{DependencyKey, NodeKind};
use crate::domain::ports::{DeclEnumerator, UseEnumerator};
use crate::domain::semantic::{Decl, DefinedEntity};
use anyhow::{Context as _, Result, bail};
use serde::{Deserialize, Serialize};

/// Everything one compiled file (or module) defines and uses, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    /// Name of the deps file this compilation produces.
    pub deps_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_fingerprint: Option<Fingerprint>,
    /// Hashed into the file fingerprint when `file_fingerprint` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    #[serde(default)]
    pub had_compilation_error: bool,
    /// Top-level functions, variables, operators, precedence groups and type aliases.
    #[serde(default)]
    pub top_level: Vec<Decl>,
    /// Nominal types and extensions.
    #[serde(default)]
    pub nominals: Vec<Decl>,
    /// Nominals whose member set may grow.
    #[serde(default)]
    pub potential_members: Vec<Decl>,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
    /// Declarations visible through dynamic lookup.
    #[serde(default)]
    pub dynamic_lookups: Vec<Decl>,
    #[serde(default)]
    pub uses: Vec<UseRecord>,
    #[serde(default)]
    pub external_dependencies: Vec<ExternalDependencyRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub nominal: Decl,
    pub member: Decl,
}

/// `user` depends on `def`. Without a user, the whole file is the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseRecord {
    pub def: DependencyKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<DependencyKey>,
}

/// Dependency on a separately compiled artifact, optionally with its fingerprint in hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDependencyRecord {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<DependencyKey>,
}

impl FileManifest {
    pub fn new(deps_name: impl Into<String>) -> Self {
        Self {
            deps_name: deps_name.into(),
            ..Default::default()
        }
    }

    /// The explicit fingerprint, else a digest of the source text, else of the manifest itself.
    pub fn whole_file_fingerprint(&self) -> Result<Fingerprint> {
        if let Some(fp) = self.file_fingerprint {
            return Ok(fp);
        }
        if let Some(text) = &self.source_text {
            return Ok(Fingerprint::from_content(text));
        }
        let canonical =
            serde_json::to_vec(self).context("Failed to serialize manifest for fingerprinting")?;
        Ok(Fingerprint::from_content(canonical))
    }

    pub fn factory_options(&self) -> Result<FactoryOptions> {
        if self.deps_name.is_empty() {
            bail!("manifest has an empty deps_name");
        }
        Ok(
            FactoryOptions::new(self.deps_name.clone(), self.whole_file_fingerprint()?)
                .with_compilation_error(self.had_compilation_error),
        )
    }

    fn whole_file_user(&self) -> DependencyKey {
        SourceFileDepGraph::source_file_key(&self.deps_name)
    }

    fn standalone(decls: &[Decl]) -> Vec<DefinedEntity> {
        decls.iter().cloned().map(DefinedEntity::Standalone).collect()
    }
}

impl DeclEnumerator for FileManifest {
    fn add_all_defined_decls(&self, decls: &mut DefinedDecls<'_>) {
        decls.add_all_defined_decls_of_a_given_type(
            NodeKind::TopLevel,
            &Self::standalone(&self.top_level),
        );
        decls.add_all_defined_decls_of_a_given_type(
            NodeKind::Nominal,
            &Self::standalone(&self.nominals),
        );
        decls.add_all_defined_decls_of_a_given_type(
            NodeKind::PotentialMember,
            &Self::standalone(&self.potential_members),
        );
        let members: Vec<DefinedEntity> = self
            .members
            .iter()
            .map(|m| DefinedEntity::member(m.nominal.clone(), m.member.clone()))
            .collect();
        decls.add_all_defined_decls_of_a_given_type(NodeKind::Member, &members);
        decls.add_all_defined_decls_of_a_given_type(
            NodeKind::DynamicLookup,
            &Self::standalone(&self.dynamic_lookups),
        );
    }
}

impl UseEnumerator for FileManifest {
    fn add_all_used_decls(&self, uses: &mut UsedDecls<'_>) {
        let whole_file = self.whole_file_user();
        for record in &self.uses {
            let user = record.user.as_ref().unwrap_or(&whole_file);
            uses.add_a_used_decl(&record.def, user);
        }
        for record in &self.external_dependencies {
            let fingerprint = match record.fingerprint.as_deref().map(str::parse::<Fingerprint>) {
                None => None,
                Some(Ok(fp)) => Some(fp),
                Some(Err(e)) => {
                    uses.diagnostics().error(format!(
                        "malformed external dependency record for '{}': {:#}",
                        record.path, e
                    ));
                    continue;
                }
            };
            let user = record.user.as_ref().unwrap_or(&whole_file);
            uses.add_an_external_dependency(
                &DependencyKey::for_external_dependency(&record.path),
                user,
                fingerprint,
            );
        }
    }
}
