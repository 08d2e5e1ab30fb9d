//! JSON declaration manifests: a frontend-independent description of what one file defines
//! and uses.

pub mod adapter;
pub mod model;

pub use adapter::JsonManifestSource;
pub use model::{ExternalDependencyRecord, FileManifest, MemberRecord, UseRecord};
