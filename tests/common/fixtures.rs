//! Test fixture generators for integration tests.
#![allow(dead_code)]

use fine_grained_deps::adapters::manifest::{
    ExternalDependencyRecord, FileManifest, MemberRecord, UseRecord,
};
use fine_grained_deps::domain::fingerprint::Fingerprint;
use fine_grained_deps::domain::key::{DeclAspect, DependencyKey, NodeKind};
use fine_grained_deps::domain::semantic::{Decl, DeclKind};

pub fn function(name: &str) -> Decl {
    Decl::new(name, DeclKind::Function)
}

pub fn structure(name: &str, body: &str) -> Decl {
    Decl::new(name, DeclKind::Struct)
        .with_mangled_name(format!("4main{}{}V", name.len(), name))
        .with_body_fingerprint(Fingerprint::from_content(body))
}

pub fn top_level_key(aspect: DeclAspect, name: &str) -> DependencyKey {
    DependencyKey::new(NodeKind::TopLevel, aspect, "", name)
}

pub fn nominal_key(aspect: DeclAspect, mangled: &str) -> DependencyKey {
    DependencyKey::new(NodeKind::Nominal, aspect, mangled, "")
}

pub fn member_key(aspect: DeclAspect, mangled: &str, name: &str) -> DependencyKey {
    DependencyKey::new(NodeKind::Member, aspect, mangled, name)
}

/// A file defining `func f`, `struct S { func m }`, where `f`'s body uses `S` and `g`.
pub fn simple_manifest() -> FileManifest {
    let s = structure("S", "struct S { func m() }");
    let mut manifest = FileManifest::new("main.deps");
    manifest.source_text = Some("func f() { S().m(); g() }\nstruct S { func m() {} }".into());
    manifest.top_level = vec![function("f")];
    manifest.nominals = vec![s.clone()];
    manifest.potential_members = vec![s.clone()];
    manifest.members = vec![MemberRecord {
        nominal: s,
        member: function("m"),
    }];
    manifest.uses = vec![
        UseRecord {
            def: nominal_key(DeclAspect::Interface, "4main1SV"),
            user: Some(top_level_key(DeclAspect::Implementation, "f")),
        },
        UseRecord {
            def: top_level_key(DeclAspect::Interface, "g"),
            user: Some(top_level_key(DeclAspect::Implementation, "f")),
        },
    ];
    manifest
}

pub fn external(path: &str, fingerprint: Option<&str>) -> ExternalDependencyRecord {
    ExternalDependencyRecord {
        path: path.to_string(),
        fingerprint: fingerprint.map(str::to_string),
        user: None,
    }
}
