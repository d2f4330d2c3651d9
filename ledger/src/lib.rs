//! Ledger library crate.
//!
//! This crate provides the core building blocks for a single-node,
//! hash-chained provenance ledger for Ayurvedic herb batches:
//!
//! - strongly-typed domain types (`types`),
//! - the append-only chained log and the service around it (`ledger`),
//! - per-transaction-type business rules (`rules`),
//! - storage backends (`storage`),
//! - consumer-facing provenance views (`provenance`),
//! - Prometheus-based metrics (`metrics`),
//! - and a top-level node configuration (`config`).
//!
//! Higher-level binaries compose these pieces into collector, lab and
//! processor tooling; the bundled binary runs a scripted end-to-end
//! flow against a file-backed ledger.

pub mod config;
pub mod ledger;
pub mod metrics;
pub mod provenance;
pub mod rules;
pub mod storage;
pub mod types;

// Re-export top-level configuration types.
pub use config::{LedgerConfig, MetricsConfig};

// Re-export "core" ledger types and traits.
pub use ledger::{
    ChainIntegrityError, LedgerError, LedgerService, SubmitReceipt, TransactionLog,
    ValidationError,
};

// Re-export the rule layer.
pub use rules::{
    AcceptAllValidator, QualityThresholds, RuleSet, RuleWarning, RulesConfig, SpeciesProfile,
    TxValidator,
};

// Re-export storage backends.
pub use storage::{FileStoreConfig, InMemoryBackend, JsonFileBackend, LogBackend, StorageError};

// Re-export provenance views.
pub use provenance::{BatchFilter, BatchState, LedgerSummary, ProvenanceBundle};

// Re-export metrics registry and ledger metrics.
pub use metrics::{LedgerMetrics, MetricsRegistry, run_prometheus_http_server};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Type alias for the validator stack used by a "typical" node.
///
/// This is the full rule set: geo-fence + season for collections,
/// threshold-derived status for quality tests, prerequisite + stage
/// ordering for processing.
pub type DefaultValidator = RuleSet;

/// Type alias for the default log backend.
pub type DefaultBackend = JsonFileBackend;

/// Type alias for the default ledger service stack.
///
/// This uses:
///
/// - [`DefaultBackend`] (atomic JSON file persistence),
/// - [`DefaultValidator`] (the full rule set).
pub type DefaultLedgerService = LedgerService<DefaultBackend, DefaultValidator>;
