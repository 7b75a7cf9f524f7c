//! Logical path to storage address resolution
//!
//! Both providers run caller paths through [`KeyResolver`] so that a
//! path means the same thing on disk and in a bucket: empty and `.`
//! segments collapse, and `..` is rejected instead of being resolved
//! against the host filesystem.

use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Resolves logical paths inside an optional namespace prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyResolver {
    prefix: Option<String>,
}

impl KeyResolver {
    /// Create a resolver for `namespace`. An empty namespace means no prefix.
    pub fn new(namespace: &str) -> Result<Self, StorageError> {
        let segments = normalize(namespace)?;
        let prefix = if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        };
        Ok(Self { prefix })
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Resolve `path` to a `/`-separated key under the prefix
    pub fn resolve(&self, path: &str) -> Result<String, StorageError> {
        let relative = normalize_non_empty(path)?.join("/");
        Ok(match &self.prefix {
            Some(prefix) => format!("{}/{}", prefix, relative),
            None => relative,
        })
    }

    /// Resolve `path` to a filesystem location under `root`
    pub fn resolve_under(&self, root: &Path, path: &str) -> Result<PathBuf, StorageError> {
        let mut full = root.to_path_buf();
        if let Some(prefix) = &self.prefix {
            full.extend(prefix.split('/'));
        }
        full.extend(normalize_non_empty(path)?);
        Ok(full)
    }
}

fn normalize_non_empty(path: &str) -> Result<Vec<&str>, StorageError> {
    let segments = normalize(path)?;
    if segments.is_empty() {
        return Err(StorageError::InvalidPath(format!(
            "path {:?} does not name an object",
            path
        )));
    }
    Ok(segments)
}

fn normalize(path: &str) -> Result<Vec<&str>, StorageError> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(StorageError::InvalidPath(format!(
                    "path {:?} escapes its namespace",
                    path
                )));
            }
            s if s.contains('\\') || s.chars().any(|c| c.is_ascii_control()) => {
                return Err(StorageError::InvalidPath(format!(
                    "path {:?} contains a forbidden character",
                    path
                )));
            }
            s => segments.push(s),
        }
    }
    Ok(segments)
}
