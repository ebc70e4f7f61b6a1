//! Inventory of the files already present in a watched directory.

use std::path::PathBuf;

use tracing::debug;
use walkdir::WalkDir;

use crate::event::extension_of;

/// Lists the files of one directory tree by extension.
#[derive(Debug, Clone)]
pub struct FileIndexer {
    /// Root of the indexed tree.
    root: PathBuf,
}

impl FileIndexer {
    /// Create an indexer for `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List the regular files under the root whose extension is
    /// `extension`, recursively, in file name order.
    ///
    /// Symbolic links are followed. A missing root yields no files.
    pub fn list_files(&self, extension: &str) -> Vec<PathBuf> {
        let files: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| extension_of(e.path()) == Some(extension))
            .map(walkdir::DirEntry::into_path)
            .collect();

        debug!(
            "Found {} .{extension} files under {}",
            files.len(),
            self.root.display()
        );
        files
    }
}
