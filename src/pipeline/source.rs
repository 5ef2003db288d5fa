//! Where document text comes from.
//!
//! The resolver only ever asks two questions of the outside world: "is there
//! a file here?" and "what does it say?". [`ContentSource`] is that seam.
//! [`FsSource`] answers from disk; [`MemorySource`] answers from a map, for
//! callers whose project never touches the disk.

use crate::error::SourceError;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Read access to LaTeX sources.
pub trait ContentSource: Send + Sync {
    /// True if `path` names an existing regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// The file's full text.
    fn read(&self, path: &Path) -> Result<String, SourceError>;
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl ContentSource for FsSource {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> Result<String, SourceError> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SourceError::NotFound,
            _ => SourceError::Io(e),
        })?;
        String::from_utf8(bytes).map_err(|_| SourceError::NotUtf8)
    }
}

/// An in-memory file tree keyed by path.
///
/// Paths are matched exactly as given, so callers should insert the same
/// absolute paths the resolver will compute.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    /// Builder-style [`MemorySource::insert`].
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl ContentSource for MemorySource {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &Path) -> Result<String, SourceError> {
        self.files.get(path).cloned().ok_or(SourceError::NotFound)
    }
}
