use crate::pattern::FilePattern;
use crate::{Storage, StoreError};
use manifold_schema::{validate_relative_path, File};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory storage. Enumeration follows `HashMap` iteration order, which
/// is unspecified.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    pub fn remove(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.remove(path).is_some())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, StoreError> {
        self.files
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Storage for MemoryStorage {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock()?.get(path).cloned())
    }

    fn write(&self, file: &File) -> Result<(), StoreError> {
        validate_relative_path(&file.path)
            .map_err(|_| StoreError::InvalidPath(file.path.clone()))?;
        self.lock()?.insert(file.path.clone(), file.data.clone());
        Ok(())
    }

    fn fetch_by_pattern(&self, pattern: &str) -> Result<Vec<File>, StoreError> {
        let pattern = FilePattern::parse(pattern)?;
        Ok(self
            .lock()?
            .iter()
            .filter(|(path, _)| pattern.matches(path))
            .map(|(path, data)| File::new(path.clone(), data.clone()))
            .collect())
    }
}
