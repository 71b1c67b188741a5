//! Snapshot Storage
//!
//! Layout: `<base_dir>/<scenario>/<scale>/<adapter>.snap`, plain UTF-8 with no
//! header. Content is stored byte-for-byte: trailing whitespace and line-ending
//! style are part of an engine's observable behavior.
//!
//! Writes go through a temp file in the target directory followed by a rename.
//! Concurrent writers are not coordinated; the last rename wins.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// File extension for snapshot files
pub const SNAPSHOT_EXTENSION: &str = "snap";

/// Snapshot I/O failures
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Reading or writing a snapshot file failed
    #[error("snapshot I/O error at {}: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl SnapshotError {
    fn io(path: &Path, source: io::Error) -> Self {
        SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Build the scenario part of a snapshot key: `<scenario>/<scale>`
pub fn scenario_key(scenario: &str, scale: &str) -> String {
    format!("{}/{}", scenario, scale)
}

/// Filesystem-backed snapshot storage
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    base_dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `base_dir` (created lazily on first save)
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Path of the snapshot for `key` and `adapter`
    pub fn path_for(&self, key: &str, adapter: &str) -> PathBuf {
        let mut path = self.base_dir.clone();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path.push(format!("{}.{}", adapter, SNAPSHOT_EXTENSION));
        path
    }

    /// Persist `content` as the snapshot for `key` and `adapter`, replacing any previous one
    pub fn save(&self, key: &str, adapter: &str, content: &str) -> Result<PathBuf, SnapshotError> {
        let path = self.path_for(key, adapter);
        let dir = path.parent().unwrap_or(&self.base_dir);

        std::fs::create_dir_all(dir).map_err(|e| SnapshotError::io(dir, e))?;

        let mut staged = NamedTempFile::new_in(dir).map_err(|e| SnapshotError::io(dir, e))?;
        let staged_path = staged.path().to_path_buf();
        staged
            .write_all(content.as_bytes())
            .map_err(|e| SnapshotError::io(&staged_path, e))?;
        staged
            .flush()
            .map_err(|e| SnapshotError::io(&staged_path, e))?;
        staged
            .persist(&path)
            .map_err(|e| SnapshotError::io(&path, e.error))?;

        Ok(path)
    }

    /// Load the snapshot for `key` and `adapter`; `None` if it was never saved
    pub fn load(&self, key: &str, adapter: &str) -> Result<Option<String>, SnapshotError> {
        let path = self.path_for(key, adapter);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::io(&path, e)),
        }
    }

    /// Whether a snapshot exists for `key` and `adapter`
    pub fn exists(&self, key: &str, adapter: &str) -> bool {
        self.path_for(key, adapter).is_file()
    }
}
