//! Dashboard-side scans: batch listings, filters and aggregate counts.

use serde::Serialize;

use crate::types::{Transaction, TxKind, TxPayload};

use super::assemble::{assemble, batch_ids};

/// Filter over collection transactions for dashboard listings.
///
/// All fields are optional and combined with AND; the default filter
/// matches everything.
#[derive(Clone, Debug, Default)]
pub struct BatchFilter {
    /// Match the collecting farmer's stable identifier exactly.
    pub farmer_id: Option<String>,
    /// Inclusive lower bound on the harvest timestamp (Unix millis).
    pub harvested_from: Option<u64>,
    /// Inclusive upper bound on the harvest timestamp (Unix millis).
    pub harvested_to: Option<u64>,
    /// Case-insensitive substring match against batch id, species and
    /// farmer name.
    pub text: Option<String>,
}

impl BatchFilter {
    fn matches(&self, tx: &Transaction) -> bool {
        let TxPayload::Collection(ev) = &tx.payload else {
            return false;
        };
        if let Some(farmer_id) = &self.farmer_id {
            if &ev.farmer_id != farmer_id {
                return false;
            }
        }
        if let Some(from) = self.harvested_from {
            if ev.harvested_at < from {
                return false;
            }
        }
        if let Some(to) = self.harvested_to {
            if ev.harvested_at > to {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            let hit = ev.batch_id.as_str().to_lowercase().contains(&needle)
                || ev.species.to_lowercase().contains(&needle)
                || ev.farmer_name.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

/// Returns the collection transactions matching `filter`, in append
/// order.
pub fn filter_batches<'a>(log: &'a [Transaction], filter: &BatchFilter) -> Vec<&'a Transaction> {
    log.iter().filter(|tx| filter.matches(tx)).collect()
}

/// Returns every transaction submitted by one party (farmer, lab or
/// processor), in append order.
pub fn filter_by_submitter<'a>(log: &'a [Transaction], submitter_id: &str) -> Vec<&'a Transaction> {
    log.iter()
        .filter(|tx| tx.payload.submitter_id() == Some(submitter_id))
        .collect()
}

/// Aggregate counts over the whole ledger, for dashboards.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    /// All committed transactions, genesis included.
    pub total_transactions: usize,
    /// Distinct batches (collection transactions with a new batch id).
    pub batch_count: usize,
    /// Quality test transactions.
    pub quality_test_count: usize,
    /// Processing snapshot transactions.
    pub processing_count: usize,
    /// Batches with both a quality test and a processing record.
    pub verified_batch_count: usize,
}

/// Computes the dashboard summary with a single pass per metric.
pub fn summarize(log: &[Transaction]) -> LedgerSummary {
    let ids = batch_ids(log);
    let verified_batch_count = ids
        .iter()
        .filter_map(|id| assemble(log, id))
        .filter(|b| b.is_verified)
        .count();

    LedgerSummary {
        total_transactions: log.len(),
        batch_count: ids.len(),
        quality_test_count: log.iter().filter(|tx| tx.kind == TxKind::QualityTest).count(),
        processing_count: log.iter().filter(|tx| tx.kind == TxKind::Processing).count(),
        verified_batch_count,
    }
}
