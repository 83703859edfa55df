use crate::layout::OutputLayout;
use crate::pattern::FilePattern;
use crate::{fsync_dir, Storage, StoreError};
use manifold_schema::File;
use std::fs;
use std::io::{ErrorKind, Write};
use tempfile::NamedTempFile;
use tracing::debug;

/// Filesystem-backed storage rooted at an [`OutputLayout`].
///
/// Writes go through a `NamedTempFile` in the destination directory and are
/// persisted with an atomic rename, so a reader never observes a half-written
/// file. Hidden entries (including in-flight temp files) are never enumerated.
pub struct DirStorage {
    layout: OutputLayout,
}

impl DirStorage {
    pub fn new(layout: OutputLayout) -> Self {
        Self { layout }
    }

    pub fn open(root: impl Into<std::path::PathBuf>) -> Self {
        Self::new(OutputLayout::new(root))
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }
}

impl Storage for DirStorage {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let abs = self.layout.resolve(path)?;
        match fs::read(&abs) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, file: &File) -> Result<(), StoreError> {
        let dest = self.layout.resolve(&file.path)?;
        let dir = dest
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(file.path.clone()))?;
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&file.data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&dest).map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(dir)?;

        debug!("wrote {} ({} bytes)", file.path, file.data.len());
        Ok(())
    }

    fn fetch_by_pattern(&self, pattern: &str) -> Result<Vec<File>, StoreError> {
        let pattern = FilePattern::parse(pattern)?;
        let dir = self.layout.resolve_dir(pattern.dir())?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.starts_with('.') || !pattern.matches_name(&name) {
                continue;
            }
            let path = if pattern.dir().is_empty() {
                name
            } else {
                format!("{}/{name}", pattern.dir())
            };
            let data = fs::read(entry.path())?;
            files.push(File { path, data });
        }
        Ok(files)
    }
}
