//! The append-only, hash-chained transaction log.
//!
//! [`TransactionLog`] owns the ordered transaction sequence, the chain
//! metadata, and the `latest_hash` chain head. All mutation happens in
//! [`TransactionLog::append`], which assigns the identifier, timestamp,
//! content hash and chain link, pushes the entry, and persists the whole
//! document through the injected [`LogBackend`] before reporting
//! success. On a persist failure the in-memory push is rolled back, so
//! memory and disk never disagree about committed entries.

use tracing::{info, warn};

use crate::storage::{ChainMetadata, LogBackend, PersistedLog, StorageError};
use crate::types::{Transaction, TxHash, TxId, TxKind, TxPayload, current_unix_millis};

use super::error::{ChainIntegrityError, LedgerError};

/// Fixed chain identifier for this prototype deployment.
const CHAIN_ID: &str = "herb-provenance-chain-v1";

/// Append-only transaction log with an injected persistence backend.
pub struct TransactionLog<B> {
    backend: B,
    doc: PersistedLog,
    /// Hash of the last appended transaction. Updated only inside the
    /// append path, never recomputed by scanning.
    latest_hash: TxHash,
}

impl<B: LogBackend> TransactionLog<B> {
    /// Opens the log from the backend.
    ///
    /// If a document exists it is loaded and the full chain is verified;
    /// tampering with the persisted file surfaces as
    /// [`LedgerError::Integrity`]. If no document exists, a
    /// deterministic genesis transaction is created and persisted as the
    /// chain root.
    pub fn open(mut backend: B) -> Result<Self, LedgerError> {
        match backend.load()? {
            Some(doc) => {
                let latest_hash = doc
                    .transactions
                    .last()
                    .map(|tx| tx.hash)
                    .unwrap_or_else(TxHash::zero);
                let log = Self {
                    backend,
                    doc,
                    latest_hash,
                };
                log.verify_chain()?;
                info!(
                    chain_id = %log.doc.metadata.chain_id,
                    transactions = log.doc.transactions.len(),
                    "ledger loaded from backend"
                );
                Ok(log)
            }
            None => {
                let genesis = Self::genesis_transaction();
                let latest_hash = genesis.hash;
                let doc = PersistedLog {
                    transactions: vec![genesis],
                    metadata: ChainMetadata {
                        chain_id: CHAIN_ID.to_string(),
                        created_at: current_unix_millis(),
                    },
                };
                let mut log = Self {
                    backend,
                    doc,
                    latest_hash,
                };
                log.backend.persist(&log.doc)?;
                info!(chain_id = CHAIN_ID, "created new ledger with genesis");
                Ok(log)
            }
        }
    }

    /// Builds the deterministic chain root.
    ///
    /// Fixed id, fixed payload, zero timestamp and an all-zero
    /// `previous_hash` sentinel, so every fresh ledger starts from the
    /// same root hash.
    fn genesis_transaction() -> Transaction {
        let id = TxId::genesis();
        let payload = TxPayload::Genesis;
        let hash = Transaction::content_hash(&id, &payload);
        Transaction {
            kind: TxKind::Genesis,
            id,
            payload,
            created_at: 0,
            hash,
            previous_hash: TxHash::zero(),
        }
    }

    /// Appends a payload as a new committed transaction.
    ///
    /// Assigns the id, a monotonically non-decreasing timestamp, the
    /// content hash, and the chain link, then persists the whole
    /// document. The entry only counts as committed once the backend
    /// reports durability; on persist failure the push is rolled back
    /// and the chain head is unchanged.
    ///
    /// Callers must serialize access (the service wraps the log in a
    /// write lock); interleaved appends would race on the chain head.
    pub fn append(&mut self, payload: TxPayload) -> Result<&Transaction, StorageError> {
        let id = TxId::generate();
        let created_at = current_unix_millis().max(self.last_created_at());
        let hash = Transaction::content_hash(&id, &payload);
        let tx = Transaction {
            kind: payload.kind(),
            id,
            payload,
            created_at,
            hash,
            previous_hash: self.latest_hash,
        };

        self.doc.transactions.push(tx);
        if let Err(e) = self.backend.persist(&self.doc) {
            // Keep memory consistent with disk: the entry was never
            // committed.
            self.doc.transactions.pop();
            warn!("append rolled back after persist failure: {e}");
            return Err(e);
        }
        self.latest_hash = hash;

        Ok(self
            .doc
            .transactions
            .last()
            .expect("transaction was just appended"))
    }

    /// Returns the full ordered transaction sequence.
    pub fn scan_all(&self) -> &[Transaction] {
        &self.doc.transactions
    }

    /// Returns all transactions of the given kind, in append order.
    pub fn scan_by_kind(&self, kind: TxKind) -> impl Iterator<Item = &Transaction> {
        self.doc.transactions.iter().filter(move |tx| tx.kind == kind)
    }

    /// Hash of the last appended transaction (the chain head).
    pub fn latest_hash(&self) -> TxHash {
        self.latest_hash
    }

    /// Number of committed transactions, genesis included.
    pub fn len(&self) -> usize {
        self.doc.transactions.len()
    }

    /// `true` if the log holds no transactions (never the case once
    /// opened, since opening creates genesis).
    pub fn is_empty(&self) -> bool {
        self.doc.transactions.is_empty()
    }

    /// Chain metadata (id + creation time).
    pub fn metadata(&self) -> &ChainMetadata {
        &self.doc.metadata
    }

    fn last_created_at(&self) -> u64 {
        self.doc.transactions.last().map(|tx| tx.created_at).unwrap_or(0)
    }

    /// Re-walks the whole chain, checking every content hash and every
    /// `previous_hash` link.
    pub fn verify_chain(&self) -> Result<(), ChainIntegrityError> {
        let txs = &self.doc.transactions;
        if let Some(first) = txs.first() {
            if first.kind != TxKind::Genesis || first.previous_hash != TxHash::zero() {
                return Err(ChainIntegrityError::MissingGenesis);
            }
        }
        for (i, tx) in txs.iter().enumerate() {
            if i > 0 && tx.kind == TxKind::Genesis {
                return Err(ChainIntegrityError::UnexpectedGenesis { index: i });
            }
            if !tx.verify_content() {
                return Err(ChainIntegrityError::ContentMismatch { index: i });
            }
            if i > 0 && tx.previous_hash != txs[i - 1].hash {
                return Err(ChainIntegrityError::BrokenLink { index: i });
            }
        }
        Ok(())
    }
}
