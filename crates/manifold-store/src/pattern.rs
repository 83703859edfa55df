use crate::StoreError;

/// Glob-style query over relative file paths.
///
/// The pattern is `<dir>/<name>` (or just `<name>` for the storage root). Only
/// the final component may contain `*`, which matches any run of characters
/// other than `/`. `manifests/*` therefore selects every file directly under
/// `manifests/` and nothing in its subdirectories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    dir: String,
    name: String,
}

impl FilePattern {
    pub fn parse(pattern: &str) -> Result<Self, StoreError> {
        let invalid = |reason: &str| StoreError::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: reason.to_owned(),
        };

        if pattern.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if pattern.starts_with('/') {
            return Err(invalid("pattern must be relative"));
        }

        let (dir, name) = match pattern.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", pattern),
        };
        if name.is_empty() {
            return Err(invalid("file name part is empty"));
        }
        if dir.contains('*') {
            return Err(invalid("wildcards are only allowed in the file name"));
        }
        if !dir.is_empty()
            && dir
                .split('/')
                .any(|seg| seg.is_empty() || seg == "." || seg == "..")
        {
            return Err(invalid("directory part must be a plain relative path"));
        }

        Ok(Self {
            dir: dir.to_owned(),
            name: name.to_owned(),
        })
    }

    /// Directory the pattern enumerates, relative to the storage root ("" for the root).
    pub fn dir(&self) -> &str {
        &self.dir
    }

    pub fn matches(&self, path: &str) -> bool {
        let (dir, name) = match path.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", path),
        };
        dir == self.dir && self.matches_name(name)
    }

    /// Match a bare file name against the final pattern component.
    pub fn matches_name(&self, name: &str) -> bool {
        !name.contains('/') && wildcard_match(&self.name, name)
    }
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return text.is_empty();
    };
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        // No wildcard at all: exact match.
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
