//! Consumer-facing provenance views over the transaction log.
//!
//! Nothing in this module mutates state: bundles, listings and
//! summaries are all recomputed from the committed transaction sequence
//! each time they are asked for.

pub mod assemble;
pub mod bundle;
pub mod query;

pub use assemble::{assemble, batch_ids};
pub use bundle::{BatchState, ProvenanceBundle};
pub use query::{BatchFilter, LedgerSummary, filter_batches, filter_by_submitter, summarize};
