use crate::core::models::entry::Entry;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The identifier is unknown to the source. This is an expected outcome.
    #[error("Entry '{identifier}' was not found")]
    NotFound { identifier: String },

    #[error("Failed to read entry file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to parse entry file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Entry file {path} holds identifier '{found}', expected '{expected}'")]
    IdentifierMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

/// A source of crystal entries keyed by identifier.
pub trait EntryProvider: Send + Sync {
    fn fetch(&self, identifier: &str) -> Result<Entry, ProviderError>;
}

/// Reads entries from `<root>/<IDENTIFIER>.json`.
#[derive(Debug, Clone)]
pub struct DirectoryEntryProvider {
    root: PathBuf,
}

impl DirectoryEntryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, identifier: &str) -> PathBuf {
        self.root.join(format!("{}.json", identifier))
    }
}

impl EntryProvider for DirectoryEntryProvider {
    fn fetch(&self, identifier: &str) -> Result<Entry, ProviderError> {
        let path = self.entry_path(identifier);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ProviderError::NotFound {
                    identifier: identifier.to_string(),
                });
            }
            Err(source) => return Err(ProviderError::Io { path, source }),
        };
        debug!("Read entry file {}", path.display());

        let entry: Entry = serde_json::from_str(&content).map_err(|source| {
            ProviderError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        if entry.identifier != identifier {
            return Err(ProviderError::IdentifierMismatch {
                path,
                expected: identifier.to_string(),
                found: entry.identifier,
            });
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"{
        "identifier": "WATERX",
        "formula": "H2 O1",
        "cell": { "lengths": [3.0, 3.0, 3.0], "angles": [90.0, 90.0, 90.0] },
        "components": [{ "atoms": [{ "index": 1, "element": "O", "position": [0.0, 0.0, 0.0] }] }]
    }"#;

    #[test]
    fn fetches_entry_from_json_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("WATERX.json"), MINIMAL).unwrap();
        let provider = DirectoryEntryProvider::new(dir.path());
        let entry = provider.fetch("WATERX").unwrap();
        assert_eq!(entry.formula, "H2 O1");
        assert_eq!(entry.components[0].atoms.len(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let provider = DirectoryEntryProvider::new(dir.path());
        assert!(matches!(
            provider.fetch("NOPE00"),
            Err(ProviderError::NotFound { identifier }) if identifier == "NOPE00"
        ));
    }

    #[test]
    fn malformed_json_reports_path() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("BROKEN.json"), "{ not json").unwrap();
        let err = DirectoryEntryProvider::new(dir.path())
            .fetch("BROKEN")
            .unwrap_err();
        match err {
            ProviderError::Parse { path, .. } => assert!(path.ends_with("BROKEN.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn identifier_must_match_file_name() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("OTHER1.json"), MINIMAL).unwrap();
        let err = DirectoryEntryProvider::new(dir.path())
            .fetch("OTHER1")
            .unwrap_err();
        assert!(matches!(err, ProviderError::IdentifierMismatch { .. }));
    }
}
