//! Provenance assembly: folding the log into per-batch bundles.

use crate::types::{BatchId, Transaction, TxPayload};

use super::bundle::{BatchState, ProvenanceBundle};

/// Assembles the provenance bundle for `batch_id` from the committed
/// transaction sequence.
///
/// Single forward scan; for every payload kind the latest entry in
/// append order wins (a retest or a corrected collection supersedes
/// the previous one). Returns `None` if no collection transaction
/// exists for the batch.
pub fn assemble(log: &[Transaction], batch_id: &BatchId) -> Option<ProvenanceBundle> {
    let mut collection = None;
    let mut quality_test = None;
    let mut processing = None;
    let mut transaction_count = 0usize;

    for tx in log {
        if tx.payload.batch_id() != Some(batch_id) {
            continue;
        }
        transaction_count += 1;
        match &tx.payload {
            TxPayload::Collection(ev) => collection = Some(ev.clone()),
            TxPayload::QualityTest(ev) => quality_test = Some(ev.clone()),
            TxPayload::Processing(ev) => processing = Some(ev.clone()),
            TxPayload::Genesis => {}
        }
    }

    let collection = collection?;
    let is_verified = quality_test.is_some() && processing.is_some();
    let state = derive_state(&quality_test, &processing);

    Some(ProvenanceBundle {
        batch_id: batch_id.clone(),
        collection,
        quality_test,
        processing,
        is_verified,
        transaction_count,
        state,
    })
}

fn derive_state(
    quality_test: &Option<crate::types::QualityTestEvent>,
    processing: &Option<crate::types::ProcessingEvent>,
) -> BatchState {
    match (quality_test, processing) {
        (None, _) => BatchState::New,
        (Some(_), None) => BatchState::Tested,
        (Some(_), Some(p)) if !p.all_completed() => BatchState::Processing,
        (Some(_), Some(p)) if p.qr_ref.is_some() => BatchState::QrIssued,
        (Some(_), Some(_)) => BatchState::Complete,
    }
}

/// All batch identifiers present in the log, in first-seen order.
pub fn batch_ids(log: &[Transaction]) -> Vec<BatchId> {
    let mut seen = Vec::new();
    for tx in log {
        if let TxPayload::Collection(ev) = &tx.payload {
            if !seen.contains(&ev.batch_id) {
                seen.push(ev.batch_id.clone());
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CollectionEvent, GpsPoint, ProcessingEvent, QualityStatus, QualityTestEvent, StageStatus,
        Transaction, TxHash, TxId,
    };

    fn tx(payload: TxPayload) -> Transaction {
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

    fn collection(batch: &str) -> TxPayload {
        TxPayload::Collection(CollectionEvent {
            batch_id: BatchId::new(batch),
            species: "Tulsi".to_string(),
            gps: GpsPoint {
                lat: 22.0,
                lng: 78.0,
                altitude: None,
            },
            harvested_at: 1_700_000_000_000,
            moisture_pct: 11.0,
            farmer_name: "S. Patel".to_string(),
            farmer_id: "FARM-007".to_string(),
            notes: None,
            photo_ref: None,
        })
    }

    fn quality(batch: &str, status: QualityStatus) -> TxPayload {
        TxPayload::QualityTest(QualityTestEvent {
            batch_id: BatchId::new(batch),
            dna_marker: "ITS2-0001".to_string(),
            pesticide_ppm: 0.02,
            moisture_pct: 12.0,
            heavy_metals_ppm: None,
            lab_name: "AyurLab".to_string(),
            lab_id: "LAB-001".to_string(),
            tested_at: 1_700_100_000_000,
            status,
            report_ref: None,
        })
    }

    fn processing(batch: &str, all_done: bool, qr: Option<&str>) -> TxPayload {
        let status = if all_done {
            StageStatus::Completed
        } else {
            StageStatus::InProgress
        };
        TxPayload::Processing(ProcessingEvent {
            batch_id: BatchId::new(batch),
            drying: status,
            grinding: if all_done { status } else { StageStatus::Pending },
            packaging: if all_done { status } else { StageStatus::Pending },
            processor_name: "HerbWorks".to_string(),
            processor_id: "PROC-003".to_string(),
            history: Vec::new(),
            qr_ref: qr.map(str::to_string),
        })
    }

    #[test]
    fn unknown_batch_assembles_to_none() {
        let log = vec![tx(collection("B1"))];
        assert!(assemble(&log, &BatchId::new("GHOST")).is_none());
    }

    #[test]
    fn collection_only_batch_is_new_and_unverified() {
        let log = vec![tx(collection("B1"))];
        let bundle = assemble(&log, &BatchId::new("B1")).expect("bundle");

        assert!(!bundle.is_verified);
        assert_eq!(bundle.state, BatchState::New);
        assert_eq!(bundle.transaction_count, 1);
        assert!(bundle.quality_test.is_none());
    }

    #[test]
    fn latest_collection_wins_for_resubmitted_batches() {
        let first = collection("B1");
        let TxPayload::Collection(mut corrected) = collection("B1") else {
            unreachable!()
        };
        corrected.farmer_name = "A. Nair".to_string();
        corrected.farmer_id = "FARM-019".to_string();

        let log = vec![tx(first), tx(TxPayload::Collection(corrected))];
        let bundle = assemble(&log, &BatchId::new("B1")).expect("bundle");

        assert_eq!(bundle.collection.farmer_id, "FARM-019");
        assert_eq!(bundle.transaction_count, 2);
    }

    #[test]
    fn latest_quality_test_wins_over_earlier_ones() {
        let log = vec![
            tx(collection("B1")),
            tx(quality("B1", QualityStatus::Failed)),
            tx(quality("B1", QualityStatus::Passed)),
        ];
        let bundle = assemble(&log, &BatchId::new("B1")).expect("bundle");

        let test = bundle.quality_test.expect("latest test");
        assert_eq!(test.status, QualityStatus::Passed);
        assert_eq!(bundle.transaction_count, 3);
        assert_eq!(bundle.state, BatchState::Tested);
    }

    #[test]
    fn verified_requires_both_test_and_processing() {
        let log = vec![
            tx(collection("B1")),
            tx(quality("B1", QualityStatus::Passed)),
            tx(processing("B1", false, None)),
        ];
        let bundle = assemble(&log, &BatchId::new("B1")).expect("bundle");

        assert!(bundle.is_verified);
        assert_eq!(bundle.state, BatchState::Processing);
    }

    #[test]
    fn failed_test_still_counts_as_verified() {
        // Presence-based verification: the consumer view shows the
        // failed status, it does not hide the batch.
        let log = vec![
            tx(collection("B1")),
            tx(quality("B1", QualityStatus::Failed)),
            tx(processing("B1", false, None)),
        ];
        let bundle = assemble(&log, &BatchId::new("B1")).expect("bundle");
        assert!(bundle.is_verified);
    }

    #[test]
    fn completed_batch_with_qr_is_qr_issued() {
        let log = vec![
            tx(collection("B1")),
            tx(quality("B1", QualityStatus::Passed)),
            tx(processing("B1", true, Some("QR-B1-001"))),
        ];
        let bundle = assemble(&log, &BatchId::new("B1")).expect("bundle");

        assert_eq!(bundle.state, BatchState::QrIssued);
    }

    #[test]
    fn completed_batch_without_qr_is_complete() {
        let log = vec![
            tx(collection("B1")),
            tx(quality("B1", QualityStatus::Passed)),
            tx(processing("B1", true, None)),
        ];
        let bundle = assemble(&log, &BatchId::new("B1")).expect("bundle");
        assert_eq!(bundle.state, BatchState::Complete);
    }

    #[test]
    fn batches_do_not_bleed_into_each_other() {
        let log = vec![
            tx(collection("B1")),
            tx(collection("B2")),
            tx(quality("B2", QualityStatus::Passed)),
        ];

        let b1 = assemble(&log, &BatchId::new("B1")).expect("bundle");
        assert!(b1.quality_test.is_none());
        assert_eq!(b1.transaction_count, 1);

        let b2 = assemble(&log, &BatchId::new("B2")).expect("bundle");
        assert!(b2.quality_test.is_some());
    }

    #[test]
    fn batch_ids_come_back_in_first_seen_order() {
        let log = vec![
            tx(collection("B2")),
            tx(collection("B1")),
            tx(quality("B2", QualityStatus::Passed)),
        ];
        let ids = batch_ids(&log);
        assert_eq!(ids, vec![BatchId::new("B2"), BatchId::new("B1")]);
    }
}
