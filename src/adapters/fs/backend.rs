use crate::domain::ports::OutputBackend;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes outputs to the file system, optionally below a root directory.
#[derive(Debug, Clone, Default)]
pub struct OnDiskOutputBackend {
    root: Option<PathBuf>,
}

impl OnDiskOutputBackend {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Relative output paths are resolved against `root`.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl OutputBackend for OnDiskOutputBackend {
    fn open_output(&self, path: &Path) -> Result<Box<dyn Write + '_>> {
        let full_path = self.resolve(path);
        if let Some(parent) = full_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = File::create(&full_path)
            .with_context(|| format!("Failed to create output file: {}", full_path.display()))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Discards everything written to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullOutputBackend;

impl OutputBackend for NullOutputBackend {
    fn open_output(&self, _path: &Path) -> Result<Box<dyn Write + '_>> {
        Ok(Box::new(std::io::sink()))
    }
}
