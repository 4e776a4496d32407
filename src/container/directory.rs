use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PyramidError;

use super::TileSink;

/// Writes each tile as a file under a root directory.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Create the root directory.
    ///
    /// Parent directories are created as needed, but `root` itself must not
    /// exist yet so an earlier pyramid is never mixed with a new one.
    pub fn create(root: &Path) -> Result<Self, PyramidError> {
        if let Some(parent) = root.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::create_dir(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TileSink for DirectorySink {
    fn write_tile(&mut self, path: &str, data: &[u8]) -> Result<(), PyramidError> {
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, data)?;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), PyramidError> {
        Ok(())
    }
}
