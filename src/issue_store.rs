//! On-disk layout for exported issues and their attachments.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use redmine_api::IssueDocument;
use serde_json::{Map as JsonMap, Value};
use thiserror::Error;

const ISSUES_DIR: &str = "issues";
const ATTACHMENTS_DIR: &str = "attachments";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("issue {id} could not be serialized: {source}")]
    Serialize {
        id: u64,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed store rooted at the output directory: one `issues/<id>.json`
/// per issue and one `attachments/<id>/` directory per issue.
#[derive(Debug, Clone)]
pub struct IssueStore {
    issues_dir: PathBuf,
    attachments_dir: PathBuf,
}

impl IssueStore {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        let base = output_dir.as_ref();
        Self {
            issues_dir: base.join(ISSUES_DIR),
            attachments_dir: base.join(ATTACHMENTS_DIR),
        }
    }

    pub fn issues_dir(&self) -> &Path {
        &self.issues_dir
    }

    pub fn attachments_dir(&self) -> &Path {
        &self.attachments_dir
    }

    pub fn issue_path(&self, id: u64) -> PathBuf {
        self.issues_dir.join(format!("{id}.json"))
    }

    pub fn attachment_dir(&self, id: u64) -> PathBuf {
        self.attachments_dir.join(id.to_string())
    }

    pub fn attachment_path(&self, id: u64, filename: &str) -> PathBuf {
        self.attachment_dir(id).join(filename)
    }

    /// True when a regular file already holds this issue.
    pub fn exists(&self, id: u64) -> bool {
        self.issue_path(id).is_file()
    }

    /// Creates both subtrees and any missing parents. Safe to call repeatedly.
    pub fn ensure_layout(&self) -> Result<(), StorageError> {
        for dir in [&self.issues_dir, &self.attachments_dir] {
            fs::create_dir_all(dir).map_err(|source| StorageError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Writes the document as sorted, 2-space indented JSON, replacing any
    /// previous export of the same issue.
    pub fn save_issue(&self, id: u64, document: &IssueDocument) -> Result<PathBuf, StorageError> {
        let content = render_document(document.as_value())
            .map_err(|source| StorageError::Serialize { id, source })?;
        let path = self.issue_path(id);
        fs::write(&path, content).map_err(|source| StorageError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Deterministic rendering: keys sorted at every depth, non-ASCII kept as is.
pub fn render_document(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&sorted(value))
}

// Rebuilds objects in key order so the output does not depend on whether
// serde_json keeps insertion order.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut ordered = JsonMap::with_capacity(map.len());
            for key in keys {
                ordered.insert(key.clone(), sorted(&map[key.as_str()]));
            }
            Value::Object(ordered)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
