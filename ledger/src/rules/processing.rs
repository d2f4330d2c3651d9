//! Processing rules: prerequisite passing test and stage ordering.
//!
//! A processing snapshot is only valid when:
//!
//! - the batch exists and its **latest** quality test did not fail
//!   (passed-with-warnings is acceptable),
//! - no stage is in progress or completed while its predecessor is not
//!   yet completed (drying → grinding → packaging),
//! - no stage has regressed relative to the previously committed
//!   snapshot for the same batch,
//! - the previously committed transition history survives as a prefix
//!   of the new snapshot's history.

use crate::ledger::error::ValidationError;
use crate::types::{
    BatchId, ProcessingEvent, ProcessingStage, QualityStatus, StageStatus, Transaction, TxPayload,
};

use super::RuleWarning;
use super::quality::batch_exists;

/// Returns the latest quality status recorded for `batch_id`, if any.
fn latest_test_status(log: &[Transaction], batch_id: &BatchId) -> Option<QualityStatus> {
    log.iter()
        .rev()
        .find_map(|tx| match &tx.payload {
            TxPayload::QualityTest(ev) if &ev.batch_id == batch_id => Some(ev.status),
            _ => None,
        })
}

/// Returns the latest committed processing snapshot for `batch_id`.
fn latest_processing<'a>(log: &'a [Transaction], batch_id: &BatchId) -> Option<&'a ProcessingEvent> {
    log.iter()
        .rev()
        .find_map(|tx| match &tx.payload {
            TxPayload::Processing(ev) if &ev.batch_id == batch_id => Some(ev),
            _ => None,
        })
}

/// Rule checker for processing snapshots.
#[derive(Clone, Debug, Default)]
pub struct ProcessingRules;

impl ProcessingRules {
    pub fn new() -> Self {
        Self
    }

    fn check_prerequisites(
        &self,
        ev: &ProcessingEvent,
        log: &[Transaction],
    ) -> Result<(), ValidationError> {
        if !batch_exists(log, &ev.batch_id) {
            return Err(ValidationError::BatchNotFound(ev.batch_id.clone()));
        }
        match latest_test_status(log, &ev.batch_id) {
            None => Err(ValidationError::MissingQualityTest(ev.batch_id.clone())),
            Some(QualityStatus::Failed) => {
                Err(ValidationError::QualityTestFailed(ev.batch_id.clone()))
            }
            Some(_) => Ok(()),
        }
    }

    fn check_stage_order(&self, ev: &ProcessingEvent) -> Result<(), ValidationError> {
        for stage in ProcessingStage::ALL {
            if ev.stage_status(stage) == StageStatus::Pending {
                continue;
            }
            if let Some(pred) = stage.predecessor() {
                if ev.stage_status(pred) != StageStatus::Completed {
                    return Err(ValidationError::StageOrder {
                        stage,
                        predecessor: pred,
                    });
                }
            }
        }
        Ok(())
    }

    fn check_no_regression(
        &self,
        ev: &ProcessingEvent,
        prev: &ProcessingEvent,
    ) -> Result<(), ValidationError> {
        for stage in ProcessingStage::ALL {
            if ev.stage_status(stage) < prev.stage_status(stage) {
                return Err(ValidationError::StageRegression { stage });
            }
        }
        Ok(())
    }

    fn check_history(
        &self,
        ev: &ProcessingEvent,
        prev: &ProcessingEvent,
    ) -> Result<(), ValidationError> {
        // The committed history must survive as a prefix of the new one.
        let keeps_prefix = ev.history.len() >= prev.history.len()
            && ev.history[..prev.history.len()] == prev.history[..];
        if !keeps_prefix {
            return Err(ValidationError::HistoryNotAppendOnly(ev.batch_id.clone()));
        }
        Ok(())
    }

    /// Validates a processing snapshot against the existing log.
    pub fn check(
        &self,
        ev: &ProcessingEvent,
        log: &[Transaction],
    ) -> Result<Vec<RuleWarning>, ValidationError> {
        self.check_prerequisites(ev, log)?;
        self.check_stage_order(ev)?;
        if let Some(prev) = latest_processing(log, &ev.batch_id) {
            self.check_no_regression(ev, prev)?;
            self.check_history(ev, prev)?;
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CollectionEvent, GpsPoint, QualityTestEvent, StageTransition, TxHash, TxId,
    };

    fn tx_from(payload: TxPayload) -> Transaction {
        let id = TxId::generate();
        let hash = Transaction::content_hash(&id, &payload);
        Transaction {
            kind: payload.kind(),
            id,
            payload,
            created_at: 1_700_000_000_000,
            hash,
            previous_hash: TxHash::zero(),
        }
    }

    fn collection_tx(batch: &str) -> Transaction {
        tx_from(TxPayload::Collection(CollectionEvent {
            batch_id: BatchId::new(batch),
            species: "Ashwagandha".to_string(),
            gps: GpsPoint {
                lat: 26.9,
                lng: 75.8,
                altitude: None,
            },
            harvested_at: 1_700_000_000_000,
            moisture_pct: 11.0,
            farmer_name: "R. Meena".to_string(),
            farmer_id: "FARM-042".to_string(),
            notes: None,
            photo_ref: None,
        }))
    }

    fn quality_tx(batch: &str, status: QualityStatus) -> Transaction {
        tx_from(TxPayload::QualityTest(QualityTestEvent {
            batch_id: BatchId::new(batch),
            dna_marker: "ITS2-7781".to_string(),
            pesticide_ppm: 0.03,
            moisture_pct: 12.5,
            heavy_metals_ppm: Some(0.01),
            lab_name: "AyurLab Jaipur".to_string(),
            lab_id: "LAB-009".to_string(),
            tested_at: 1_700_100_000_000,
            status,
            report_ref: None,
        }))
    }

    fn snapshot(
        batch: &str,
        drying: StageStatus,
        grinding: StageStatus,
        packaging: StageStatus,
    ) -> ProcessingEvent {
        ProcessingEvent {
            batch_id: BatchId::new(batch),
            drying,
            grinding,
            packaging,
            processor_name: "HerbWorks".to_string(),
            processor_id: "PROC-003".to_string(),
            history: Vec::new(),
            qr_ref: None,
        }
    }

    fn tested_log(batch: &str, status: QualityStatus) -> Vec<Transaction> {
        vec![collection_tx(batch), quality_tx(batch, status)]
    }

    #[test]
    fn first_stage_needs_no_predecessor() {
        let rules = ProcessingRules::new();
        let log = tested_log("B1", QualityStatus::Passed);
        let ev = snapshot(
            "B1",
            StageStatus::InProgress,
            StageStatus::Pending,
            StageStatus::Pending,
        );
        assert!(rules.check(&ev, &log).is_ok());
    }

    #[test]
    fn grinding_before_drying_completed_is_rejected() {
        let rules = ProcessingRules::new();
        let log = tested_log("B1", QualityStatus::Passed);
        let ev = snapshot(
            "B1",
            StageStatus::InProgress,
            StageStatus::InProgress,
            StageStatus::Pending,
        );

        let err = rules.check(&ev, &log).unwrap_err();
        match err {
            ValidationError::StageOrder { stage, predecessor } => {
                assert_eq!(stage, ProcessingStage::Grinding);
                assert_eq!(predecessor, ProcessingStage::Drying);
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn completed_pipeline_is_accepted() {
        let rules = ProcessingRules::new();
        let log = tested_log("B1", QualityStatus::Warning);
        let ev = snapshot(
            "B1",
            StageStatus::Completed,
            StageStatus::Completed,
            StageStatus::Completed,
        );
        assert!(rules.check(&ev, &log).is_ok());
    }

    #[test]
    fn processing_without_quality_test_is_rejected() {
        let rules = ProcessingRules::new();
        let log = vec![collection_tx("B1")];
        let ev = snapshot(
            "B1",
            StageStatus::InProgress,
            StageStatus::Pending,
            StageStatus::Pending,
        );

        let err = rules.check(&ev, &log).unwrap_err();
        assert!(matches!(err, ValidationError::MissingQualityTest(_)));
    }

    #[test]
    fn processing_after_failed_test_is_rejected() {
        let rules = ProcessingRules::new();
        let log = tested_log("B1", QualityStatus::Failed);
        let ev = snapshot(
            "B1",
            StageStatus::InProgress,
            StageStatus::Pending,
            StageStatus::Pending,
        );

        let err = rules.check(&ev, &log).unwrap_err();
        assert!(matches!(err, ValidationError::QualityTestFailed(_)));
    }

    #[test]
    fn latest_test_wins_for_the_prerequisite() {
        let rules = ProcessingRules::new();
        // Failed first, retested and passed later: processing may proceed.
        let mut log = tested_log("B1", QualityStatus::Failed);
        log.push(quality_tx("B1", QualityStatus::Passed));

        let ev = snapshot(
            "B1",
            StageStatus::InProgress,
            StageStatus::Pending,
            StageStatus::Pending,
        );
        assert!(rules.check(&ev, &log).is_ok());
    }

    #[test]
    fn stage_regression_is_rejected() {
        let rules = ProcessingRules::new();
        let mut log = tested_log("B1", QualityStatus::Passed);
        log.push(tx_from(TxPayload::Processing(snapshot(
            "B1",
            StageStatus::Completed,
            StageStatus::InProgress,
            StageStatus::Pending,
        ))));

        let ev = snapshot(
            "B1",
            StageStatus::Completed,
            StageStatus::Pending,
            StageStatus::Pending,
        );
        let err = rules.check(&ev, &log).unwrap_err();
        match err {
            ValidationError::StageRegression { stage } => {
                assert_eq!(stage, ProcessingStage::Grinding);
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    fn transition(stage: ProcessingStage, status: StageStatus, at: u64) -> StageTransition {
        StageTransition {
            stage,
            status,
            at,
            by: "PROC-003".to_string(),
        }
    }

    #[test]
    fn dropping_committed_history_is_rejected() {
        let rules = ProcessingRules::new();
        let mut committed = snapshot(
            "B1",
            StageStatus::InProgress,
            StageStatus::Pending,
            StageStatus::Pending,
        );
        committed.history = vec![transition(
            ProcessingStage::Drying,
            StageStatus::InProgress,
            1_700_200_000_000,
        )];

        let mut log = tested_log("B1", QualityStatus::Passed);
        log.push(tx_from(TxPayload::Processing(committed)));

        // Same stage statuses, but the earlier transition is gone.
        let ev = snapshot(
            "B1",
            StageStatus::InProgress,
            StageStatus::Pending,
            StageStatus::Pending,
        );
        let err = rules.check(&ev, &log).unwrap_err();
        assert!(matches!(err, ValidationError::HistoryNotAppendOnly(_)));
    }

    #[test]
    fn extending_committed_history_is_accepted() {
        let rules = ProcessingRules::new();
        let first = transition(
            ProcessingStage::Drying,
            StageStatus::InProgress,
            1_700_200_000_000,
        );
        let mut committed = snapshot(
            "B1",
            StageStatus::InProgress,
            StageStatus::Pending,
            StageStatus::Pending,
        );
        committed.history = vec![first.clone()];

        let mut log = tested_log("B1", QualityStatus::Passed);
        log.push(tx_from(TxPayload::Processing(committed)));

        let mut ev = snapshot(
            "B1",
            StageStatus::Completed,
            StageStatus::Pending,
            StageStatus::Pending,
        );
        ev.history = vec![
            first,
            transition(
                ProcessingStage::Drying,
                StageStatus::Completed,
                1_700_300_000_000,
            ),
        ];
        assert!(rules.check(&ev, &log).is_ok());
    }

    #[test]
    fn processing_for_unknown_batch_is_rejected() {
        let rules = ProcessingRules::new();
        let ev = snapshot(
            "GHOST",
            StageStatus::InProgress,
            StageStatus::Pending,
            StageStatus::Pending,
        );
        let err = rules.check(&ev, &[]).unwrap_err();
        assert!(matches!(err, ValidationError::BatchNotFound(_)));
    }
}
