use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{IndexError, IndexResult};

/// One entry produced while walking the input tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
}

/// Walks a directory tree recursively, yielding every entry with its size
pub struct Walker {
    root: PathBuf,
    follow_links: bool,
}

impl Walker {
    /// Create a new Walker rooted at `root`
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            follow_links: false,
        }
    }

    /// Follow symbolic links while walking (off by default)
    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    /// Walk the directory tree lazily.
    ///
    /// Entries that cannot be read are logged and passed on as `Err` so the
    /// caller can count them; the walk itself keeps going. A symbolic link
    /// reports the kind and size of its target, since that is what a later
    /// read will see.
    pub fn walk(&self) -> impl Iterator<Item = IndexResult<WalkEntry>> {
        WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .into_iter()
            .map(|entry| {
                let entry = entry
                    .inspect_err(|err| warn!("Skipping unreadable entry: {}", err))
                    .map_err(from_walk_error)?;
                let metadata = if entry.path_is_symlink() {
                    fs::metadata(entry.path())
                        .inspect_err(|err| {
                            warn!("Skipping broken link {}: {}", entry.path().display(), err)
                        })
                        .map_err(|err| IndexError::io(entry.path(), err))?
                } else {
                    entry.metadata().map_err(from_walk_error)?
                };
                let is_dir = metadata.is_dir();
                Ok(WalkEntry {
                    path: entry.into_path(),
                    is_dir,
                    size: if is_dir { 0 } else { metadata.len() },
                })
            })
    }
}

fn from_walk_error(err: walkdir::Error) -> IndexError {
    let path = err.path().map(PathBuf::from).unwrap_or_default();
    let message = err.to_string();
    match err.into_io_error() {
        Some(source) => IndexError::io(path, source),
        None => IndexError::io(path, io::Error::other(message)),
    }
}
