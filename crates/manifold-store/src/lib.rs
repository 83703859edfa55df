//! Storage abstraction and backends for Manifold output files.
//!
//! This crate provides the byte-level storage layer the engine writes to and
//! reloads from: the object-safe `Storage` trait, glob-style `FilePattern`
//! enumeration queries, `DirStorage` (atomic on-disk writes under an
//! `OutputLayout` root), and `MemoryStorage` for tests and dry runs.

pub mod dir;
pub mod layout;
pub mod memory;
pub mod pattern;

pub use dir::DirStorage;
pub use layout::OutputLayout;
pub use memory::MemoryStorage;
pub use pattern::FilePattern;

use manifold_schema::{File, FileSet};
use std::path::Path;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// POSIX does not guarantee a rename is durable until the parent directory
/// itself has been synced.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid storage path '{0}'")]
    InvalidPath(String),
    #[error("invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("storage lock poisoned: {0}")]
    Poisoned(String),
}

/// Byte-level read/write/enumerate access to output files by relative path.
///
/// Implementations make no promise about enumeration order; callers that need
/// a canonical order sort the result themselves.
pub trait Storage: Send + Sync {
    /// Read a single file. A missing file is `Ok(None)`.
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn write(&self, file: &File) -> Result<(), StoreError>;

    /// Return every stored file whose path matches `pattern` (see [`FilePattern`]).
    fn fetch_by_pattern(&self, pattern: &str) -> Result<Vec<File>, StoreError>;

    fn write_all(&self, files: &FileSet) -> Result<(), StoreError> {
        for file in files {
            self.write(file)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_invalid_path() {
        let e = StoreError::InvalidPath("../etc".to_owned());
        assert!(e.to_string().contains("../etc"));
    }

    #[test]
    fn store_error_display_invalid_pattern() {
        let e = StoreError::InvalidPattern {
            pattern: "*/x".to_owned(),
            reason: "wildcards are only allowed in the file name".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("*/x"));
        assert!(msg.contains("file name"));
    }

    #[test]
    fn store_error_display_poisoned() {
        let e = StoreError::Poisoned("reason".to_owned());
        assert!(e.to_string().contains("reason"));
    }

    #[test]
    fn write_all_writes_every_file() {
        let storage = MemoryStorage::new();
        let set = FileSet::from_files(vec![
            File::new("manifests/a.yaml", "a"),
            File::new("manifests/b.yaml", "b"),
        ])
        .unwrap();
        storage.write_all(&set).unwrap();
        assert_eq!(storage.read("manifests/a.yaml").unwrap().unwrap(), b"a");
        assert_eq!(storage.read("manifests/b.yaml").unwrap().unwrap(), b"b");
    }
}
