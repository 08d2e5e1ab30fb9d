//! Mock implementations for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use fine_grained_deps::domain::ports::OutputBackend;

/// Keeps every output in memory, keyed by path.
#[derive(Default)]
pub struct MemoryOutputBackend {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryOutputBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let files = self.files.lock().unwrap();
        files
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

struct MemoryWriter<'a> {
    files: &'a Mutex<HashMap<PathBuf, Vec<u8>>>,
    path: PathBuf,
}

impl Write for MemoryWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| io::Error::other("poisoned"))?;
        files.entry(self.path.clone()).or_default().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OutputBackend for MemoryOutputBackend {
    fn open_output(&self, path: &Path) -> Result<Box<dyn Write + '_>> {
        self.files
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemoryWriter {
            files: &self.files,
            path: path.to_path_buf(),
        }))
    }
}

/// Refuses to open anything.
pub struct FailingOutputBackend;

impl OutputBackend for FailingOutputBackend {
    fn open_output(&self, path: &Path) -> Result<Box<dyn Write + '_>> {
        Err(anyhow!("permission denied: {}", path.display()))
    }
}
