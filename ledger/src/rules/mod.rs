//! Per-transaction-type business rules ("smart contract" layer).
//!
//! This module provides pure rule checkers for each payload type:
//!
//! - [`collection::CollectionRules`] (fatal geo-fence, advisory season),
//! - [`quality::QualityRules`] (prerequisite batch + threshold-derived
//!   status),
//! - [`processing::ProcessingRules`] (prerequisite passing test + stage
//!   ordering),
//!
//! composed into a [`RuleSet`] behind the [`TxValidator`] trait. Rules
//! are stateless except where they must consult the existing log (e.g.
//! "does this batch have a quality test"), which is passed in as a
//! read-only slice.

pub mod collection;
pub mod config;
pub mod processing;
pub mod quality;

pub use collection::CollectionRules;
pub use config::{GeoFence, QualityThresholds, RulesConfig, SpeciesProfile};
pub use processing::ProcessingRules;
pub use quality::QualityRules;

use serde::Serialize;

use crate::ledger::error::ValidationError;
use crate::types::{Transaction, TxPayload};

/// Non-fatal rule hit: the transaction still commits, but the receipt
/// carries the warning and it is logged at `warn` level.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RuleWarning {
    /// Harvest month outside the species' season window.
    OutOfSeason {
        species: String,
        month: u32,
        allowed_months: Vec<u32>,
    },
    /// Moisture outside the regulatory band (but within hard limits).
    MoistureOutsideRegulatory { value_pct: f64, min_pct: f64, max_pct: f64 },
    /// Moisture within the regulatory band but outside the optimal band.
    MoistureOutsideOptimal { value_pct: f64, min_pct: f64, max_pct: f64 },
}

impl std::fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleWarning::OutOfSeason {
                species,
                month,
                allowed_months,
            } => write!(
                f,
                "{species} harvested in month {month}, outside season {allowed_months:?}"
            ),
            RuleWarning::MoistureOutsideRegulatory {
                value_pct,
                min_pct,
                max_pct,
            } => write!(
                f,
                "moisture {value_pct}% outside regulatory band [{min_pct}, {max_pct}]%"
            ),
            RuleWarning::MoistureOutsideOptimal {
                value_pct,
                min_pct,
                max_pct,
            } => write!(
                f,
                "moisture {value_pct}% outside optimal band [{min_pct}, {max_pct}]%"
            ),
        }
    }
}

/// Pluggable validity predicate for transaction payloads.
///
/// Implementations should be deterministic and side-effect free. `log`
/// is the committed transaction sequence at validation time; the service
/// guarantees it does not change between validation and append.
///
/// A successful validation returns the (possibly empty) list of
/// non-fatal warnings; a failed one returns the typed reason and the
/// payload is not committed.
pub trait TxValidator {
    fn validate(
        &self,
        payload: &TxPayload,
        log: &[Transaction],
    ) -> Result<Vec<RuleWarning>, ValidationError>;
}

/// A trivial validator that accepts every payload.
///
/// Useful for tests and for isolating ledger mechanics from rule logic.
pub struct AcceptAllValidator;

impl TxValidator for AcceptAllValidator {
    fn validate(
        &self,
        _payload: &TxPayload,
        _log: &[Transaction],
    ) -> Result<Vec<RuleWarning>, ValidationError> {
        Ok(Vec::new())
    }
}

/// The full rule set, dispatching per payload type.
pub struct RuleSet {
    collection: CollectionRules,
    quality: QualityRules,
    processing: ProcessingRules,
}

impl RuleSet {
    /// Builds the standard rule set from configuration.
    pub fn new(cfg: &RulesConfig) -> Self {
        Self {
            collection: CollectionRules::new(cfg),
            quality: QualityRules::new(cfg),
            processing: ProcessingRules::new(),
        }
    }
}

impl TxValidator for RuleSet {
    fn validate(
        &self,
        payload: &TxPayload,
        log: &[Transaction],
    ) -> Result<Vec<RuleWarning>, ValidationError> {
        match payload {
            // The genesis payload is only ever created internally, when
            // the log is opened. A submitted one is always an error.
            TxPayload::Genesis => Err(ValidationError::Custom(
                "genesis transactions cannot be submitted".to_string(),
            )),
            TxPayload::Collection(ev) => self.collection.check(ev),
            TxPayload::QualityTest(ev) => self.quality.check(ev, log),
            TxPayload::Processing(ev) => self.processing.check(ev, log),
        }
    }
}
