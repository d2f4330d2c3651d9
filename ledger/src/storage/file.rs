//! JSON file log backend.
//!
//! This implementation persists the whole log document to a single JSON
//! file using atomic rewrite-on-write: the new document is written to a
//! temporary file in the same directory, fsynced, then renamed over the
//! old one. A crash mid-write leaves the previous committed document
//! untouched; a partial write can never silently truncate prior entries.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{LogBackend, PersistedLog, StorageError};

/// Configuration for [`JsonFileBackend`].
#[derive(Clone, Debug)]
pub struct FileStoreConfig {
    /// Filesystem path of the log file.
    pub path: PathBuf,
    /// Whether to create missing parent directories on first persist.
    pub create_dirs: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/herb-ledger.json"),
            create_dirs: true,
        }
    }
}

/// JSON-file-backed implementation of [`LogBackend`].
pub struct JsonFileBackend {
    cfg: FileStoreConfig,
}

impl JsonFileBackend {
    /// Creates a backend for the configured path.
    ///
    /// The file itself is only created on the first persist.
    pub fn new(cfg: FileStoreConfig) -> Self {
        Self { cfg }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.cfg.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.cfg.path.as_os_str().to_owned();
        os.push(".tmp");
        PathBuf::from(os)
    }
}

impl LogBackend for JsonFileBackend {
    fn load(&mut self) -> Result<Option<PersistedLog>, StorageError> {
        if !self.cfg.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.cfg.path)?;
        let doc: PersistedLog = serde_json::from_str(&raw)?;
        Ok(Some(doc))
    }

    fn persist(&mut self, log: &PersistedLog) -> Result<(), StorageError> {
        if self.cfg.create_dirs {
            if let Some(parent) = self.cfg.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }

        let json = serde_json::to_vec_pretty(log)?;

        // Write-then-rename keeps the previous document intact until the
        // new one is fully on disk.
        let tmp = self.tmp_path();
        {
            let mut f = File::create(&tmp)?;
            f.write_all(&json)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &self.cfg.path)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ChainMetadata;
    use crate::types::{Transaction, TxHash, TxId, TxPayload};
    use tempfile::TempDir;

    fn dummy_doc(tx_count: usize) -> PersistedLog {
        let mut transactions = Vec::new();
        for _ in 0..tx_count {
            let id = TxId::generate();
            let payload = TxPayload::Genesis;
            let hash = Transaction::content_hash(&id, &payload);
            transactions.push(Transaction {
                kind: payload.kind(),
                id,
                payload,
                created_at: 0,
                hash,
                previous_hash: TxHash::zero(),
            });
        }
        PersistedLog {
            transactions,
            metadata: ChainMetadata {
                chain_id: "herb-chain-test".to_string(),
                created_at: 1_700_000_000_000,
            },
        }
    }

    fn backend_in(dir: &TempDir) -> JsonFileBackend {
        JsonFileBackend::new(FileStoreConfig {
            path: dir.path().join("ledger.json"),
            create_dirs: true,
        })
    }

    #[test]
    fn load_missing_file_returns_none() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut backend = backend_in(&tmp);
        assert!(backend.load().expect("load").is_none());
    }

    #[test]
    fn persist_then_load_roundtrips() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut backend = backend_in(&tmp);

        let doc = dummy_doc(3);
        backend.persist(&doc).expect("persist");

        let loaded = backend.load().expect("load").expect("document present");
        assert_eq!(loaded, doc);
    }

    #[test]
    fn persist_replaces_the_previous_document() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut backend = backend_in(&tmp);

        backend.persist(&dummy_doc(1)).expect("first persist");
        backend.persist(&dummy_doc(2)).expect("second persist");

        let loaded = backend.load().expect("load").expect("document present");
        assert_eq!(loaded.transactions.len(), 2);
    }

    #[test]
    fn persist_creates_missing_parent_directories() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut backend = JsonFileBackend::new(FileStoreConfig {
            path: tmp.path().join("nested/dir/ledger.json"),
            create_dirs: true,
        });

        backend.persist(&dummy_doc(1)).expect("persist");
        assert!(backend.path().exists());
    }

    #[test]
    fn no_temp_file_is_left_behind() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut backend = backend_in(&tmp);
        backend.persist(&dummy_doc(1)).expect("persist");

        let leftovers: Vec<_> = fs::read_dir(tmp.path())
            .expect("read dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
