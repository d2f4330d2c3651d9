//! In-memory log backend.
//!
//! This implementation is useful for unit tests and throwaway devnets.
//! It keeps the last persisted document in memory and "loses" it when
//! dropped, which is exactly what tests want.

use super::{LogBackend, PersistedLog, StorageError};

/// In-memory implementation of [`LogBackend`].
#[derive(Default)]
pub struct InMemoryBackend {
    doc: Option<PersistedLog>,
}

impl InMemoryBackend {
    /// Creates a new, empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a document has been persisted.
    pub fn has_document(&self) -> bool {
        self.doc.is_some()
    }
}

impl LogBackend for InMemoryBackend {
    fn load(&mut self) -> Result<Option<PersistedLog>, StorageError> {
        Ok(self.doc.clone())
    }

    fn persist(&mut self, log: &PersistedLog) -> Result<(), StorageError> {
        self.doc = Some(log.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ChainMetadata;

    fn dummy_doc() -> PersistedLog {
        PersistedLog {
            transactions: Vec::new(),
            metadata: ChainMetadata {
                chain_id: "herb-chain-test".to_string(),
                created_at: 1_700_000_000_000,
            },
        }
    }

    #[test]
    fn load_before_persist_returns_none() {
        let mut backend = InMemoryBackend::new();
        assert!(backend.load().expect("load").is_none());
        assert!(!backend.has_document());
    }

    #[test]
    fn persist_then_load_roundtrips() {
        let mut backend = InMemoryBackend::new();
        let doc = dummy_doc();

        backend.persist(&doc).expect("persist");
        let loaded = backend.load().expect("load").expect("document present");
        assert_eq!(loaded, doc);
    }
}
