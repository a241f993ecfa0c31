//! Raw file loading and format tagging.

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IndexError, IndexResult};

/// How the bytes of a loaded file should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    PlainText,
    Archive,
    Unknown,
}

impl SourceKind {
    /// Tag by file extension, ignoring case.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("txt") => SourceKind::PlainText,
            Some("zip") => SourceKind::Archive,
            _ => SourceKind::Unknown,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::PlainText => write!(f, "text"),
            SourceKind::Archive => write!(f, "archive"),
            SourceKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A loaded file on its way to an indexer.
#[derive(Debug, Clone)]
pub struct RawUnit {
    pub path: PathBuf,
    pub kind: SourceKind,
    pub bytes: Vec<u8>,
}

impl RawUnit {
    /// Wrap bytes read from `path`, tagged by its extension.
    pub fn new(path: PathBuf, bytes: Vec<u8>) -> Self {
        let kind = SourceKind::from_path(&path);
        Self { path, kind, bytes }
    }
}

/// Read the whole file into memory.
pub fn read_file(path: &Path) -> IndexResult<Vec<u8>> {
    fs::read(path).map_err(|err| IndexError::io(path, err))
}
