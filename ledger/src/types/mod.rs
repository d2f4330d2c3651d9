//! Core domain types used by the ledger.
//!
//! This module defines strongly-typed hashes, transaction and batch
//! identifiers, and small geographic/time primitives that are shared
//! across the ledger implementation. The goal is to avoid "naked"
//! strings and byte buffers in public APIs and instead use
//! domain-specific newtypes.

use chrono::{Datelike, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Transaction payload types and the chained [`Transaction`] record.
pub mod tx;

pub use tx::{
    CollectionEvent, ProcessingEvent, ProcessingStage, QualityStatus, QualityTestEvent,
    StageStatus, StageTransition, Transaction, TxKind, TxPayload,
};

/// Length in bytes of all 256-bit hash types used in this module.
pub const HASH_LEN: usize = 32;

/// Strongly-typed 256-bit hash wrapper (BLAKE3-256).
///
/// This type backs all fixed-size hashes in the ledger (content hashes
/// and chain links). It is always exactly [`HASH_LEN`] bytes long and is
/// serialized as a lowercase hex string so the persisted log file stays
/// human-readable.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Hash256(pub [u8; HASH_LEN]);

impl Hash256 {
    /// Computes a new [`Hash256`] as the BLAKE3-256 hash of `data`.
    ///
    /// The result is deterministic for a given byte slice and is suitable
    /// for use as a content hash, but it is **not** a password hash or KDF.
    pub fn compute(data: &[u8]) -> Self {
        let h = blake3::hash(data);
        Hash256(*h.as_bytes())
    }

    /// Returns the underlying 32-byte hash as a borrowed array.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Returns the hash as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        if bytes.len() != HASH_LEN {
            return Err(serde::de::Error::custom(format!(
                "expected {HASH_LEN}-byte hash, got {} bytes",
                bytes.len()
            )));
        }
        let mut arr = [0u8; HASH_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Hash256(arr))
    }
}

/// Strongly-typed transaction content hash.
///
/// This is the digest of a transaction's `(id, payload)` pair, computed
/// over the canonical bincode-2 serialization. Wrapping the underlying
/// [`Hash256`] avoids passing raw byte arrays around in public APIs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub Hash256);

impl TxHash {
    /// The all-zero sentinel used as the genesis transaction's
    /// `previous_hash` (the chain root has no predecessor).
    pub fn zero() -> Self {
        TxHash(Hash256([0u8; HASH_LEN]))
    }

    /// Returns the underlying [`Hash256`].
    pub fn as_hash(&self) -> &Hash256 {
        &self.0
    }
}

/// Unique, service-assigned transaction identifier.
///
/// Identifiers are generated at submission time (never client-supplied)
/// as `TX-<uuid-v4>`. The genesis transaction uses a fixed identifier so
/// the chain root is deterministic.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    /// Generates a fresh, unique transaction identifier.
    pub fn generate() -> Self {
        TxId(format!("TX-{}", uuid::Uuid::new_v4()))
    }

    /// The fixed identifier of the genesis transaction.
    pub fn genesis() -> Self {
        TxId("GENESIS".to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Batch identifier: one harvested lot of a herb species.
///
/// A batch id is created exactly once by a collection event and then
/// referenced by every later transaction for that lot.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub String);

impl BatchId {
    /// Wraps an externally supplied batch identifier.
    pub fn new(id: impl Into<String>) -> Self {
        BatchId(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// GPS point captured at harvest time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Altitude in metres above sea level, when the device reports one.
    pub altitude: Option<f64>,
}

/// Returns the current wall-clock time as milliseconds since Unix epoch.
pub fn current_unix_millis() -> u64 {
    let ms = Utc::now().timestamp_millis();
    // Clamp times before the epoch to 0 rather than wrapping.
    if ms < 0 { 0 } else { ms as u64 }
}

/// Extracts the calendar month (1..=12, UTC) from a millisecond timestamp.
///
/// Returns `None` if the timestamp does not map to a valid instant.
pub fn month_of_unix_millis(ms: u64) -> Option<u32> {
    let ms = i64::try_from(ms).ok()?;
    Utc.timestamp_millis_opt(ms).single().map(|dt| dt.month())
}
