//! The consumer-facing provenance bundle.

use serde::Serialize;

use crate::types::{BatchId, CollectionEvent, ProcessingEvent, QualityTestEvent};

/// Lifecycle state of a batch, derived from its transactions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// Collected, no quality test yet.
    New,
    /// Quality test recorded, no processing yet.
    Tested,
    /// Processing underway, not all stages completed.
    Processing,
    /// All three stages completed.
    Complete,
    /// Completed and a QR reference has been issued.
    QrIssued,
}

/// Everything the ledger knows about one batch, assembled from the log.
///
/// The bundle is recomputed from the transaction sequence on every
/// query; nothing here is stored separately, so it can never drift from
/// the chain.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceBundle {
    /// Batch this bundle describes.
    pub batch_id: BatchId,

    /// The latest committed harvest event for the batch.
    pub collection: CollectionEvent,

    /// Latest quality test, if any was recorded.
    pub quality_test: Option<QualityTestEvent>,

    /// Latest processing snapshot, if any was recorded.
    pub processing: Option<ProcessingEvent>,

    /// `true` once both a quality test and a processing record exist.
    ///
    /// Presence-based on purpose: a batch whose latest test failed still
    /// counts as verified here, and the consumer view shows the failed
    /// status alongside. Gating on outcomes happens at submission time.
    pub is_verified: bool,

    /// Number of committed transactions referencing this batch.
    pub transaction_count: usize,

    /// Derived lifecycle state.
    pub state: BatchState,
}
