//! Transaction service: the single-writer submission path.
//!
//! [`LedgerService`] wires together a [`TransactionLog`] and a
//! [`TxValidator`] and exposes the narrow interface the boundary layer
//! consumes: typed submit calls, provenance queries, and dashboard
//! scans. All mutation is serialized through an internal write lock so
//! that validating against the current log, computing the chain link,
//! and appending happen atomically with respect to other writers, so
//! the check-then-act race on "read last hash, then append" cannot
//! occur. Reads take the read lock and run concurrently.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{info, warn};

use crate::provenance::{
    BatchFilter, LedgerSummary, ProvenanceBundle, assemble, filter_batches, filter_by_submitter,
    summarize,
};
use crate::rules::{RuleWarning, RulesConfig, TxValidator, quality};
use crate::storage::{ChainMetadata, LogBackend};
use crate::types::{
    BatchId, CollectionEvent, ProcessingEvent, QualityTestEvent, Transaction, TxHash, TxId, TxKind,
    TxPayload,
};

use super::error::{ChainIntegrityError, LedgerError};
use super::log::TransactionLog;

/// Structured result of a successful submission.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    /// Service-assigned transaction identifier.
    pub transaction_id: TxId,
    /// Content hash of the committed transaction.
    pub hash: TxHash,
    /// Commit timestamp, milliseconds since Unix epoch.
    pub committed_at: u64,
    /// Non-fatal rule hits (e.g. out-of-season harvest). The
    /// transaction committed regardless.
    pub warnings: Vec<RuleWarning>,
}

/// Transaction service over a log backend `B` and validator `V`.
pub struct LedgerService<B, V> {
    log: RwLock<TransactionLog<B>>,
    validator: V,
    rules: RulesConfig,
}

impl<B, V> LedgerService<B, V>
where
    B: LogBackend,
    V: TxValidator,
{
    /// Creates a new service around an opened log.
    pub fn new(log: TransactionLog<B>, validator: V, rules: RulesConfig) -> Self {
        Self {
            log: RwLock::new(log),
            validator,
            rules,
        }
    }

    fn read_log(&self) -> RwLockReadGuard<'_, TransactionLog<B>> {
        self.log.read().expect("ledger lock poisoned")
    }

    fn write_log(&self) -> RwLockWriteGuard<'_, TransactionLog<B>> {
        self.log.write().expect("ledger lock poisoned")
    }

    /// Validates and appends a payload as one critical section.
    ///
    /// On a rule failure nothing is appended; on a storage failure the
    /// log is left exactly as it was. Warnings commit and are returned
    /// in the receipt.
    pub fn submit(&self, payload: TxPayload) -> Result<SubmitReceipt, LedgerError> {
        let mut log = self.write_log();

        let warnings = match self.validator.validate(&payload, log.scan_all()) {
            Ok(warnings) => warnings,
            Err(e) => {
                warn!(kind = %payload.kind(), "transaction rejected: {e}");
                return Err(LedgerError::Validation(e));
            }
        };

        let tx = log.append(payload)?;
        info!(
            id = %tx.id,
            kind = %tx.kind,
            batch = tx.payload.batch_id().map(|b| b.as_str()).unwrap_or("-"),
            "transaction committed"
        );
        for w in &warnings {
            warn!(id = %tx.id, "soft rule hit: {w}");
        }

        Ok(SubmitReceipt {
            transaction_id: tx.id.clone(),
            hash: tx.hash,
            committed_at: tx.created_at,
            warnings,
        })
    }

    /// Submits a collection event, creating a new batch.
    pub fn submit_collection(&self, ev: CollectionEvent) -> Result<SubmitReceipt, LedgerError> {
        self.submit(TxPayload::Collection(ev))
    }

    /// Submits a quality test for an existing batch.
    ///
    /// The pass/warning/fail status is derived from the configured
    /// thresholds here; any client-supplied status is overwritten.
    pub fn submit_quality_test(
        &self,
        mut ev: QualityTestEvent,
    ) -> Result<SubmitReceipt, LedgerError> {
        let (status, _) = quality::derive_status(&self.rules.quality, &ev);
        ev.status = status;
        self.submit(TxPayload::QualityTest(ev))
    }

    /// Submits a processing stage snapshot for an existing batch.
    pub fn submit_processing(&self, ev: ProcessingEvent) -> Result<SubmitReceipt, LedgerError> {
        self.submit(TxPayload::Processing(ev))
    }

    /// Assembles the provenance bundle for a batch.
    ///
    /// Recomputed from the log on every call; a batch with no
    /// collection transaction yields [`LedgerError::NotFound`].
    pub fn get_provenance(&self, batch_id: &BatchId) -> Result<ProvenanceBundle, LedgerError> {
        let log = self.read_log();
        assemble(log.scan_all(), batch_id).ok_or_else(|| LedgerError::NotFound(batch_id.clone()))
    }

    /// All collection transactions, in append order.
    pub fn list_batches(&self) -> Vec<Transaction> {
        self.read_log()
            .scan_by_kind(TxKind::Collection)
            .cloned()
            .collect()
    }

    /// All transactions of one kind, in append order.
    pub fn list_by_kind(&self, kind: TxKind) -> Vec<Transaction> {
        self.read_log().scan_by_kind(kind).cloned().collect()
    }

    /// Collection transactions matching a dashboard filter.
    pub fn filter_batches(&self, filter: &BatchFilter) -> Vec<Transaction> {
        let log = self.read_log();
        filter_batches(log.scan_all(), filter)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every transaction submitted by one party (farmer, lab or
    /// processor), in append order.
    pub fn list_by_submitter(&self, submitter_id: &str) -> Vec<Transaction> {
        let log = self.read_log();
        filter_by_submitter(log.scan_all(), submitter_id)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Aggregate counts for dashboards.
    pub fn summary(&self) -> LedgerSummary {
        summarize(self.read_log().scan_all())
    }

    /// Re-verifies every content hash and chain link.
    pub fn verify_chain(&self) -> Result<(), ChainIntegrityError> {
        self.read_log().verify_chain()
    }

    /// Number of committed transactions, genesis included.
    pub fn transaction_count(&self) -> usize {
        self.read_log().len()
    }

    /// Chain metadata (id + creation time).
    pub fn chain_metadata(&self) -> ChainMetadata {
        self.read_log().metadata().clone()
    }
}
