// ledger/src/types/tx.rs

//! Transaction types for the provenance ledger.
//!
//! This module defines the concrete supply-chain payloads recorded on the
//! ledger along with a tagged [`TxPayload`] union and the chained
//! [`Transaction`] record. Payloads cover:
//!
//! - collection events that create a new herb batch,
//! - quality test results referencing an existing batch, and
//! - processing stage snapshots (drying / grinding / packaging).
//!
//! Hashing uses **bincode 2** via the `serde` integration
//! (`bincode::serde::encode_to_vec`) with an explicit `standard()`
//! config, so the canonical byte encoding is the same everywhere.

use serde::{Deserialize, Serialize};

use super::{BatchId, GpsPoint, Hash256, TxHash, TxId};

/// Collection event: the harvest that creates a new batch.
///
/// A `CollectionEvent` is the only way to introduce a batch identifier
/// into the ledger. Every later transaction for the same lot references
/// it by [`BatchId`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEvent {
    /// Batch identifier, externally visible across all stages.
    pub batch_id: BatchId,

    /// Herb species name (e.g. `"Ashwagandha"`).
    ///
    /// Matched case-insensitively against the configured cultivation
    /// profiles for geo-fence and season checks.
    pub species: String,

    /// GPS fix captured at the harvest site.
    pub gps: GpsPoint,

    /// Harvest time in milliseconds since Unix epoch.
    pub harvested_at: u64,

    /// Field-measured moisture percentage of the lot.
    pub moisture_pct: f64,

    /// Name of the collecting farmer.
    pub farmer_name: String,

    /// Stable identifier of the collecting farmer.
    pub farmer_id: String,

    /// Free-form notes from the collector.
    pub notes: Option<String>,

    /// Reference to an off-ledger photo of the harvest, if one was taken.
    pub photo_ref: Option<String>,
}

/// Derived outcome of a quality test against the configured thresholds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityStatus {
    /// All measurements inside the optimal bands.
    Passed,
    /// Within regulatory limits but outside the optimal band.
    Warning,
    /// At least one regulatory threshold breached.
    Failed,
}

impl std::fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QualityStatus::Passed => "PASSED",
            QualityStatus::Warning => "WARNING",
            QualityStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Quality test result for an existing batch.
///
/// The `status` field is **derived** by the service from the configured
/// thresholds at submission time; client-supplied values are overwritten.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityTestEvent {
    /// Batch this test refers to (must exist as a collection event).
    pub batch_id: BatchId,

    /// DNA barcode marker confirming species identity.
    pub dna_marker: String,

    /// Measured pesticide residue in parts per million.
    pub pesticide_ppm: f64,

    /// Measured moisture percentage.
    pub moisture_pct: f64,

    /// Measured heavy-metals concentration in ppm, when tested.
    pub heavy_metals_ppm: Option<f64>,

    /// Name of the testing laboratory.
    pub lab_name: String,

    /// Stable identifier of the testing laboratory.
    pub lab_id: String,

    /// Test time in milliseconds since Unix epoch.
    pub tested_at: u64,

    /// Derived pass/warning/fail status.
    pub status: QualityStatus,

    /// Reference to an off-ledger test report, if one was filed.
    pub report_ref: Option<String>,
}

/// One of the three ordered processing stages.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Drying,
    Grinding,
    Packaging,
}

impl ProcessingStage {
    /// All stages in their mandatory order.
    pub const ALL: [ProcessingStage; 3] = [
        ProcessingStage::Drying,
        ProcessingStage::Grinding,
        ProcessingStage::Packaging,
    ];

    /// The stage that must be completed before this one may start.
    ///
    /// The first stage has no predecessor gate.
    pub fn predecessor(&self) -> Option<ProcessingStage> {
        match self {
            ProcessingStage::Drying => None,
            ProcessingStage::Grinding => Some(ProcessingStage::Drying),
            ProcessingStage::Packaging => Some(ProcessingStage::Grinding),
        }
    }
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProcessingStage::Drying => "drying",
            ProcessingStage::Grinding => "grinding",
            ProcessingStage::Packaging => "packaging",
        };
        f.write_str(s)
    }
}

/// Status of a single processing stage.
///
/// Variant order matters: statuses only ever advance, so the derived
/// `Ord` doubles as the "no regression" ordering.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    Pending,
    InProgress,
    Completed,
}

/// One recorded stage transition, kept as append-only history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTransition {
    /// Stage that changed.
    pub stage: ProcessingStage,
    /// Status the stage moved to.
    pub status: StageStatus,
    /// Transition time in milliseconds since Unix epoch.
    pub at: u64,
    /// Identifier of the operator who recorded the transition.
    pub by: String,
}

/// Processing snapshot for a batch.
///
/// Each submission carries the full current status of all three stages
/// plus the accumulated transition history. The validator checks the
/// snapshot against the previously committed one, so stages can neither
/// skip their predecessor nor move backwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingEvent {
    /// Batch this snapshot refers to.
    pub batch_id: BatchId,

    /// Drying stage status.
    pub drying: StageStatus,

    /// Grinding stage status.
    pub grinding: StageStatus,

    /// Packaging stage status.
    pub packaging: StageStatus,

    /// Name of the processing facility.
    pub processor_name: String,

    /// Stable identifier of the processing facility.
    pub processor_id: String,

    /// Append-only history of stage transitions.
    pub history: Vec<StageTransition>,

    /// QR reference issued once packaging completes.
    pub qr_ref: Option<String>,
}

impl ProcessingEvent {
    /// Returns the status of the given stage in this snapshot.
    pub fn stage_status(&self, stage: ProcessingStage) -> StageStatus {
        match stage {
            ProcessingStage::Drying => self.drying,
            ProcessingStage::Grinding => self.grinding,
            ProcessingStage::Packaging => self.packaging,
        }
    }

    /// `true` if all three stages are completed.
    pub fn all_completed(&self) -> bool {
        ProcessingStage::ALL
            .iter()
            .all(|s| self.stage_status(*s) == StageStatus::Completed)
    }
}

/// Discriminant of a transaction, stored alongside the payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Genesis,
    Collection,
    QualityTest,
    Processing,
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxKind::Genesis => "genesis",
            TxKind::Collection => "collection",
            TxKind::QualityTest => "quality_test",
            TxKind::Processing => "processing",
        };
        f.write_str(s)
    }
}

/// Tagged payload union.
///
/// One variant per transaction type, so the rule layer can be
/// exhaustively pattern-matched. The externally-tagged default
/// representation is used because it is supported by `bincode::serde`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxPayload {
    /// Deterministic chain root; carries no data.
    Genesis,
    /// Harvest event creating a batch.
    Collection(CollectionEvent),
    /// Lab result for an existing batch.
    QualityTest(QualityTestEvent),
    /// Processing stage snapshot for an existing batch.
    Processing(ProcessingEvent),
}

impl TxPayload {
    /// Returns the discriminant matching this payload.
    pub fn kind(&self) -> TxKind {
        match self {
            TxPayload::Genesis => TxKind::Genesis,
            TxPayload::Collection(_) => TxKind::Collection,
            TxPayload::QualityTest(_) => TxKind::QualityTest,
            TxPayload::Processing(_) => TxKind::Processing,
        }
    }

    /// Returns the batch this payload refers to, if any.
    pub fn batch_id(&self) -> Option<&BatchId> {
        match self {
            TxPayload::Genesis => None,
            TxPayload::Collection(ev) => Some(&ev.batch_id),
            TxPayload::QualityTest(ev) => Some(&ev.batch_id),
            TxPayload::Processing(ev) => Some(&ev.batch_id),
        }
    }

    /// Returns the stable id of the party that submitted this payload:
    /// the farmer for collections, the lab for quality tests, the
    /// processor for processing snapshots.
    pub fn submitter_id(&self) -> Option<&str> {
        match self {
            TxPayload::Genesis => None,
            TxPayload::Collection(ev) => Some(&ev.farmer_id),
            TxPayload::QualityTest(ev) => Some(&ev.lab_id),
            TxPayload::Processing(ev) => Some(&ev.processor_id),
        }
    }
}

/// One committed ledger entry. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Service-assigned unique identifier.
    pub id: TxId,

    /// Transaction type discriminant.
    #[serde(rename = "type")]
    pub kind: TxKind,

    /// Type-specific payload, stored verbatim.
    pub payload: TxPayload,

    /// Commit time in milliseconds since Unix epoch; monotonically
    /// non-decreasing across appends.
    pub created_at: u64,

    /// Content hash over `(id, payload)`.
    pub hash: TxHash,

    /// Hash of the immediately preceding log entry; all-zero for genesis.
    pub previous_hash: TxHash,
}

impl Transaction {
    /// Returns the canonical byte representation of an `(id, payload)` pair.
    ///
    /// This uses **bincode 2** with the `standard()` configuration and the
    /// `serde` integration. All content hashing goes through this method
    /// to avoid format drift.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails. This is considered a programming error,
    /// because all fields are required to be serializable.
    pub fn canonical_bytes(id: &TxId, payload: &TxPayload) -> Vec<u8> {
        let cfg = bincode::config::standard();
        bincode::serde::encode_to_vec((id, payload), cfg)
            .expect("transaction content should always be serializable with bincode 2 + serde")
    }

    /// Computes the canonical BLAKE3-256 content hash for an
    /// `(id, payload)` pair.
    ///
    /// This must remain stable across runs and processes: the persisted
    /// chain links are verified against it on reload.
    pub fn content_hash(id: &TxId, payload: &TxPayload) -> TxHash {
        let bytes = Self::canonical_bytes(id, payload);
        TxHash(Hash256::compute(&bytes))
    }

    /// `true` if the stored `hash` matches the recomputed content hash.
    pub fn verify_content(&self) -> bool {
        Self::content_hash(&self.id, &self.payload) == self.hash
    }
}
