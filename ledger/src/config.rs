//! Top-level configuration for a ledger node.
//!
//! This module aggregates configuration for:
//!
//! - business rules (`RulesConfig`: thresholds + cultivation profiles),
//! - storage (JSON log file path and creation flags),
//! - metrics exporter (enable flag + listen address).
//!
//! The goal is to have a single `LedgerConfig` struct that higher-level
//! binaries (e.g. `main.rs`) can construct from defaults, config files,
//! or environment variables as needed.

use std::net::SocketAddr;

use crate::rules::RulesConfig;
use crate::storage::FileStoreConfig;

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        // Safe to unwrap: this is a fixed, valid address literal.
        let addr: SocketAddr = "127.0.0.1:9898"
            .parse()
            .expect("hard-coded metrics listen address should parse");
        Self {
            enabled: true,
            listen_addr: addr,
        }
    }
}

/// Top-level configuration for a ledger node.
///
/// This aggregates all the sub-configs needed to wire up a typical node:
///
/// - business rules (`rules`),
/// - persistent storage (`storage`),
/// - Prometheus metrics exporter (`metrics`).
#[derive(Clone, Debug, Default)]
pub struct LedgerConfig {
    pub rules: RulesConfig,
    pub storage: FileStoreConfig,
    pub metrics: MetricsConfig,
}
