//! Quality test rules: prerequisite batch and threshold-derived status.
//!
//! The derived status distinguishes three outcomes:
//!
//! - `FAILED`: any regulatory threshold breached (pesticide, heavy
//!   metals) or moisture outside the hard limits,
//! - `WARNING`: measurements recorded but outside the regulatory or
//!   optimal moisture band,
//! - `PASSED`: everything inside the optimal bands.
//!
//! A test for a batch with no prior collection event is rejected; a
//! retest of an already-tested batch is allowed (the latest test wins in
//! the read model).

use crate::ledger::error::ValidationError;
use crate::types::{BatchId, QualityStatus, QualityTestEvent, Transaction, TxPayload};

use super::RuleWarning;
use super::config::{QualityThresholds, RulesConfig};

/// Derives the pass/warning/fail status for a set of measurements.
///
/// Returned warnings only accompany non-failed outcomes; a `FAILED`
/// status carries no warnings because the failure reason is the status
/// itself.
pub fn derive_status(
    thresholds: &QualityThresholds,
    ev: &QualityTestEvent,
) -> (QualityStatus, Vec<RuleWarning>) {
    let t = thresholds;

    let threshold_breach = ev.pesticide_ppm > t.pesticide_max_ppm
        || ev
            .heavy_metals_ppm
            .is_some_and(|hm| hm > t.heavy_metals_max_ppm);
    let moisture_hard_fail =
        ev.moisture_pct < t.moisture_hard_min_pct || ev.moisture_pct > t.moisture_hard_max_pct;

    if threshold_breach || moisture_hard_fail {
        return (QualityStatus::Failed, Vec::new());
    }

    let mut warnings = Vec::new();
    if ev.moisture_pct < t.moisture_regulatory_min_pct
        || ev.moisture_pct > t.moisture_regulatory_max_pct
    {
        warnings.push(RuleWarning::MoistureOutsideRegulatory {
            value_pct: ev.moisture_pct,
            min_pct: t.moisture_regulatory_min_pct,
            max_pct: t.moisture_regulatory_max_pct,
        });
    } else if ev.moisture_pct < t.moisture_optimal_min_pct
        || ev.moisture_pct > t.moisture_optimal_max_pct
    {
        warnings.push(RuleWarning::MoistureOutsideOptimal {
            value_pct: ev.moisture_pct,
            min_pct: t.moisture_optimal_min_pct,
            max_pct: t.moisture_optimal_max_pct,
        });
    }

    let status = if warnings.is_empty() {
        QualityStatus::Passed
    } else {
        QualityStatus::Warning
    };
    (status, warnings)
}

/// Returns `true` if the log contains a collection event for `batch_id`.
pub fn batch_exists(log: &[Transaction], batch_id: &BatchId) -> bool {
    log.iter().any(|tx| {
        matches!(&tx.payload, TxPayload::Collection(ev) if &ev.batch_id == batch_id)
    })
}

/// Rule checker for quality test events.
#[derive(Clone, Debug)]
pub struct QualityRules {
    thresholds: QualityThresholds,
}

impl QualityRules {
    /// Constructs the checker from the configured thresholds.
    pub fn new(cfg: &RulesConfig) -> Self {
        Self {
            thresholds: cfg.quality.clone(),
        }
    }

    /// Validates a quality test against the existing log.
    ///
    /// The event's `status` is expected to already hold the derived
    /// value (the service recomputes it before validation); this check
    /// re-derives it only to surface the band warnings.
    pub fn check(
        &self,
        ev: &QualityTestEvent,
        log: &[Transaction],
    ) -> Result<Vec<RuleWarning>, ValidationError> {
        if !batch_exists(log, &ev.batch_id) {
            return Err(ValidationError::BatchNotFound(ev.batch_id.clone()));
        }

        let (_, warnings) = derive_status(&self.thresholds, ev);
        Ok(warnings)
    }
}
