use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use c64patch::{hash::fnv1a, Error, Result};
use memmap2::Mmap;
use tracing::info;

/// Directory holding the input images, the payload blobs and every output.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a whole image into memory so it can be patched and grown.
    /// Missing and empty files are input errors.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let bytes = fs::read(self.root.join(name)).map_err(|error| input(name, error))?;
        if bytes.is_empty() {
            return Err(empty(name));
        }
        Ok(bytes)
    }

    /// Map a payload read-only; it is only ever copied into an image.
    pub fn map(&self, name: &str) -> Result<Mmap> {
        let file = File::open(self.root.join(name)).map_err(|error| input(name, error))?;
        if file.metadata().map_err(|error| input(name, error))?.len() == 0 {
            return Err(empty(name));
        }
        unsafe { Mmap::map(&file) }.map_err(|error| input(name, error))
    }

    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        fs::write(self.root.join(name), bytes).map_err(|source| Error::Io {
            name: name.to_owned(),
            source,
        })?;
        info!("save {} ({} bytes, fnv1a {:08X})", name, bytes.len(), fnv1a(bytes));
        Ok(())
    }
}

fn input(name: &str, error: io::Error) -> Error {
    Error::Input {
        name: name.to_owned(),
        reason: error.to_string(),
    }
}

fn empty(name: &str) -> Error {
    Error::Input {
        name: name.to_owned(),
        reason: "file is empty".to_owned(),
    }
}
