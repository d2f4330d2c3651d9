use std::fmt;

use crate::storage::StorageError;
use crate::types::{BatchId, ProcessingStage};

/// Error type returned when a payload fails a business rule.
///
/// Rule failures are always recoverable by resubmitting corrected data
/// and never mutate the log.
#[derive(Debug, PartialEq)]
pub enum ValidationError {
    /// Collection GPS outside the species' approved region.
    OutOfRegion { species: String, lat: f64, lng: f64 },
    /// Referenced batch has no collection transaction.
    BatchNotFound(BatchId),
    /// Processing submitted for a batch with no quality test.
    MissingQualityTest(BatchId),
    /// Processing submitted for a batch whose latest test failed.
    QualityTestFailed(BatchId),
    /// Stage started or completed before its predecessor completed.
    StageOrder {
        stage: ProcessingStage,
        predecessor: ProcessingStage,
    },
    /// Stage moved backwards relative to the committed snapshot.
    StageRegression { stage: ProcessingStage },
    /// Snapshot dropped or rewrote committed stage history entries.
    HistoryNotAppendOnly(BatchId),
    /// Rule failure with a dynamic message.
    Custom(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRegion { species, lat, lng } => write!(
                f,
                "invalid collection: {species} recorded at ({lat}, {lng}), outside the approved cultivation region"
            ),
            ValidationError::BatchNotFound(batch) => {
                write!(f, "invalid transaction: batch {batch} not found")
            }
            ValidationError::MissingQualityTest(batch) => {
                write!(f, "invalid processing: batch {batch} has no quality test")
            }
            ValidationError::QualityTestFailed(batch) => write!(
                f,
                "invalid processing: latest quality test for batch {batch} failed"
            ),
            ValidationError::StageOrder { stage, predecessor } => write!(
                f,
                "invalid processing: stage {stage} cannot start before {predecessor} is completed"
            ),
            ValidationError::StageRegression { stage } => {
                write!(f, "invalid processing: stage {stage} moved backwards")
            }
            ValidationError::HistoryNotAppendOnly(batch) => write!(
                f,
                "invalid processing: stage history for batch {batch} is not append-only"
            ),
            ValidationError::Custom(msg) => write!(f, "invalid transaction: {msg}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Error type returned when the persisted chain fails verification.
#[derive(Debug, PartialEq)]
pub enum ChainIntegrityError {
    /// Log is non-empty but does not start with the genesis transaction.
    MissingGenesis,
    /// A genesis transaction appears after the chain root.
    UnexpectedGenesis { index: usize },
    /// Stored content hash does not match the recomputed one.
    ContentMismatch { index: usize },
    /// `previous_hash` does not match the preceding entry's hash.
    BrokenLink { index: usize },
}

impl fmt::Display for ChainIntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainIntegrityError::MissingGenesis => {
                write!(f, "chain integrity: log does not start with genesis")
            }
            ChainIntegrityError::UnexpectedGenesis { index } => {
                write!(f, "chain integrity: genesis transaction at position {index}")
            }
            ChainIntegrityError::ContentMismatch { index } => {
                write!(f, "chain integrity: content hash mismatch at position {index}")
            }
            ChainIntegrityError::BrokenLink { index } => {
                write!(f, "chain integrity: broken chain link at position {index}")
            }
        }
    }
}

impl std::error::Error for ChainIntegrityError {}

/// High-level errors surfaced by the ledger service.
#[derive(Debug)]
pub enum LedgerError {
    /// Underlying rule failure; nothing was appended.
    Validation(ValidationError),
    /// Query for a batch with no collection transaction.
    NotFound(BatchId),
    /// Durability failure on read or write.
    Storage(StorageError),
    /// The persisted chain failed verification on load.
    Integrity(ChainIntegrityError),
}

impl From<ValidationError> for LedgerError {
    fn from(e: ValidationError) -> Self {
        LedgerError::Validation(e)
    }
}

impl From<StorageError> for LedgerError {
    fn from(e: StorageError) -> Self {
        LedgerError::Storage(e)
    }
}

impl From<ChainIntegrityError> for LedgerError {
    fn from(e: ChainIntegrityError) -> Self {
        LedgerError::Integrity(e)
    }
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Validation(e) => write!(f, "{e}"),
            LedgerError::NotFound(batch) => write!(f, "batch {batch} not found"),
            LedgerError::Storage(e) => write!(f, "{e}"),
            LedgerError::Integrity(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LedgerError {}
