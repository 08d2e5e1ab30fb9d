use crate::domain::builder::{DefinedDecls, UsedDecls};
use anyhow::Result;
use std::io::Write;
use std::path::Path;

/// Enumerates every declaration a file or module defines (implemented by a frontend).
pub trait DeclEnumerator {
    fn add_all_defined_decls(&self, decls: &mut DefinedDecls<'_>);
}

/// Enumerates every (use, def) relationship discovered while compiling a file.
pub trait UseEnumerator {
    fn add_all_used_decls(&self, uses: &mut UsedDecls<'_>);
}

impl<F> DeclEnumerator for F
where
    F: Fn(&mut DefinedDecls<'_>),
{
    fn add_all_defined_decls(&self, decls: &mut DefinedDecls<'_>) {
        self(decls)
    }
}

impl<F> UseEnumerator for F
where
    F: Fn(&mut UsedDecls<'_>),
{
    fn add_all_used_decls(&self, uses: &mut UsedDecls<'_>) {
        self(uses)
    }
}

/// Output backend used for side files and debug dumps.
pub trait OutputBackend {
    fn open_output(&self, path: &Path) -> Result<Box<dyn Write + '_>>;
}

/// Declaration manifest source port (implemented by infrastructure)
pub trait ManifestSource {
    type Manifest;

    fn load(&self) -> Result<Self::Manifest>;
}
