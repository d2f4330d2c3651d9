//! Storage backends for the ledger.
//!
//! The log is persisted as a single structured document
//! (`{transactions: [...], metadata: {chainId, createdAt}}`) behind the
//! [`LogBackend`] trait. This module provides:
//!
//! - an in-memory backend ([`mem::InMemoryBackend`]) suitable for tests,
//! - a JSON file backend ([`file::JsonFileBackend`]) with atomic
//!   whole-file rewrite for durable single-node deployments.

pub mod file;
pub mod mem;

pub use file::{FileStoreConfig, JsonFileBackend};
pub use mem::InMemoryBackend;

use serde::{Deserialize, Serialize};

use crate::types::Transaction;

/// Chain-level metadata stored next to the transaction sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadata {
    /// Stable identifier of this chain instance.
    pub chain_id: String,
    /// Creation time of the chain, milliseconds since Unix epoch.
    pub created_at: u64,
}

/// The persisted log document.
///
/// Transactions appear in append order and are never reordered or
/// rewritten in place; every persist writes the whole document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLog {
    pub transactions: Vec<Transaction>,
    pub metadata: ChainMetadata,
}

/// Storage-level error type.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying filesystem error.
    Io(std::io::Error),
    /// Malformed persisted document.
    Json(serde_json::Error),
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O error: {e}"),
            StorageError::Json(e) => write!(f, "storage encoding error: {e}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Abstract persistence interface used by the transaction log.
///
/// Implementations load and persist the whole [`PersistedLog`] document.
/// `persist` must not return success until the document is durably
/// stored; a failed persist must leave any previously stored document
/// intact.
pub trait LogBackend {
    /// Loads the stored document, or `None` if nothing was stored yet.
    fn load(&mut self) -> Result<Option<PersistedLog>, StorageError>;

    /// Durably stores the document, replacing any previous version.
    fn persist(&mut self, log: &PersistedLog) -> Result<(), StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_backend_trait_is_object_safe() {
        fn use_trait_object(backend: &mut dyn LogBackend) {
            let _ = backend.load();
        }

        let mut backend = InMemoryBackend::new();
        use_trait_object(&mut backend);
    }

    #[test]
    fn persisted_document_uses_the_wire_layout() {
        let doc = PersistedLog {
            transactions: Vec::new(),
            metadata: ChainMetadata {
                chain_id: "herb-chain-test".to_string(),
                created_at: 1_700_000_000_000,
            },
        };

        let json = serde_json::to_string(&doc).expect("encode document");
        assert!(json.contains("\"transactions\""));
        assert!(json.contains("\"chainId\""));
        assert!(json.contains("\"createdAt\""));
    }
}
