//! File events from directory watching.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file system event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEvent {
    /// The kind of event.
    pub kind: FileEventKind,

    /// Path to the affected file.
    pub path: PathBuf,

    /// When the change was detected.
    pub timestamp: DateTime<Utc>,
}

impl FileEvent {
    /// Create a new file event.
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            timestamp: Utc::now(),
        }
    }

    /// A file appeared.
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::Created, path)
    }

    /// A file's content or size changed.
    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::Changed, path)
    }

    /// A file disappeared.
    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(FileEventKind::Deleted, path)
    }

    /// Extension used to route the event, i.e. the text after the last `.`
    /// of the file name.
    pub fn extension(&self) -> Option<&str> {
        extension_of(&self.path)
    }
}

/// Kind of file event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEventKind {
    /// File was created.
    Created,

    /// File was modified.
    Changed,

    /// File was deleted.
    Deleted,
}

impl FileEventKind {
    /// Map a notify event kind. Accesses and unknown kinds are not
    /// reported.
    pub fn from_notify(kind: notify::EventKind) -> Option<Self> {
        match kind {
            notify::EventKind::Create(_) => Some(Self::Created),
            notify::EventKind::Modify(_) => Some(Self::Changed),
            notify::EventKind::Remove(_) => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Verb used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Changed => "changed",
            Self::Deleted => "deleted",
        }
    }
}

/// Extension of a file name: whatever follows the last `.`.
///
/// Unlike [`Path::extension`], a leading dot counts, so `.jar` has the
/// extension `jar`. The rest of the name does not need to be valid UTF-8.
pub fn extension_of(path: &Path) -> Option<&str> {
    let name = path.file_name()?.as_encoded_bytes();
    let dot = name.iter().rposition(|b| *b == b'.')?;
    std::str::from_utf8(&name[dot + 1..]).ok()
}
