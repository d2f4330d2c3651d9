//! Ledger core: the hash-chained log and the service around it.

pub mod error;
pub mod log;
pub mod service;

pub use error::{ChainIntegrityError, LedgerError, ValidationError};
pub use log::TransactionLog;
pub use service::{LedgerService, SubmitReceipt};
