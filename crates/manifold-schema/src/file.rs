use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileSetError {
    #[error("invalid output path '{0}': must be relative, without '..' or hidden components")]
    InvalidPath(String),
    #[error("duplicate output path '{0}'")]
    DuplicatePath(String),
}

/// An output file: a path relative to the output root plus its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub path: String,
    pub data: Vec<u8>,
}

impl File {
    pub fn new(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }

    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Check that `path` is relative, `/`-separated and stays inside the output
/// root. Dot-prefixed components are reserved for in-flight writes.
pub fn validate_relative_path(path: &str) -> Result<(), FileSetError> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|seg| seg.is_empty() || seg.starts_with('.'));
    if invalid {
        return Err(FileSetError::InvalidPath(path.to_owned()));
    }
    Ok(())
}

/// Sorted, unique-by-path collection of output files.
///
/// Lexicographic order by path is the ordering contract: every set handed to
/// storage or compared downstream is in this order, no matter how the files
/// were produced or enumerated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    files: Vec<File>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, sort, and reject duplicate paths. Identical content under two
    /// distinct paths is kept; the same path twice is an error.
    pub fn from_files(files: impl IntoIterator<Item = File>) -> Result<Self, FileSetError> {
        let mut files: Vec<File> = files.into_iter().collect();
        for file in &files {
            validate_relative_path(&file.path)?;
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        if let Some(pair) = files.windows(2).find(|w| w[0].path == w[1].path) {
            return Err(FileSetError::DuplicatePath(pair[0].path.clone()));
        }
        Ok(Self { files })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, File> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&File> {
        self.files
            .binary_search_by(|f| f.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.files[idx])
    }

    pub fn paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }

    pub fn as_slice(&self) -> &[File] {
        &self.files
    }

    pub fn into_files(self) -> Vec<File> {
        self.files
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a File;
    type IntoIter = std::slice::Iter<'a, File>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}
