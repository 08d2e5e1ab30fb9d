use crate::adapters::manifest::model::FileManifest;
use crate::domain::ports::ManifestSource;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads a [`FileManifest`] from a JSON file.
pub struct JsonManifestSource {
    path: PathBuf,
}

impl JsonManifestSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ManifestSource for JsonManifestSource {
    type Manifest = FileManifest;

    fn load(&self) -> Result<FileManifest> {
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read manifest: {}", self.path.display()))?;
        let manifest: FileManifest = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse manifest JSON: {}", self.path.display()))?;
        debug!(
            path = %self.path.display(),
            deps = %manifest.deps_name,
            "loaded declaration manifest"
        );
        Ok(manifest)
    }
}
