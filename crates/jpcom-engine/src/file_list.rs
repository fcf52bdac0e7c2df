//! Ordered input file lists consumed by session initiation.

use std::path::{Path, PathBuf};

/// How an engine should read a listed file.
///
/// [`crate::LocalEngine`] reads every entry whole whatever its level; the tag
/// is carried for engines that map files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IoLevel {
    /// Plain buffered reads.
    #[default]
    Direct,
    /// Memory-mapped reads.
    Mapped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileListEntry {
    pub path: PathBuf,
    pub io_level: IoLevel,
}

/// Ordered list of input files. Entry order is load order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    entries: Vec<FileListEntry>,
}

impl FileList {
    pub fn new() -> Self {
        Self::default()
    }

    /// One entry per path, all read at `io_level`.
    pub fn from_paths<I, P>(paths: I, io_level: IoLevel) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut list = Self::new();
        for path in paths {
            list.push(path, io_level);
        }
        list
    }

    pub fn push(&mut self, path: impl AsRef<Path>, io_level: IoLevel) {
        self.entries.push(FileListEntry {
            path: path.as_ref().to_path_buf(),
            io_level,
        });
    }

    pub fn entries(&self) -> &[FileListEntry] {
        &self.entries
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|entry| entry.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
