use crate::StoreError;
use manifold_schema::validate_relative_path;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory layout of an on-disk asset directory.
///
/// Every stored file lives at `<root>/<relative path>`; relative paths use `/`
/// separators and may never escape the root.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored file.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StoreError> {
        validate_relative_path(relative)
            .map_err(|_| StoreError::InvalidPath(relative.to_owned()))?;
        let mut path = self.root.clone();
        path.extend(relative.split('/'));
        Ok(path)
    }

    /// Absolute location of a directory, where "" is the root itself.
    pub fn resolve_dir(&self, relative: &str) -> Result<PathBuf, StoreError> {
        if relative.is_empty() {
            return Ok(self.root.clone());
        }
        self.resolve(relative)
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }
}
