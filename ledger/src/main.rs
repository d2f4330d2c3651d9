// src/main.rs
//
// Minimal demo node that wires up the ledger library:
//
// - JSON-file-backed storage
// - Full rule set (geo-fence, thresholds, stage ordering)
// - Prometheus metrics exporter on /metrics
// - Scripted collection -> quality test -> processing flow for one
//   batch, ending with the consumer provenance bundle on stdout.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use ledger::{
    BatchId,
    CollectionEvent,
    GpsPoint,
    // Top-level config
    LedgerConfig,
    LedgerError,
    // Metrics
    MetricsRegistry,
    ProcessingEvent,
    ProcessingStage,
    QualityStatus,
    QualityTestEvent,
    // Validator + service stack
    RuleSet,
    StageStatus,
    StageTransition,
    SubmitReceipt,
    // Storage backend + log
    JsonFileBackend,
    TransactionLog,
    current_unix_millis,
    run_prometheus_http_server,
};

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "ledger=info".to_string()))
        .init();

    if let Err(err) = run_node().await {
        eprintln!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn run_node() -> Result<(), String> {
    // For now, just use defaults. Later you can load from a file/CLI/env.
    let cfg = LedgerConfig::default();

    // ---------------------------
    // Metrics registry + exporter
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new().map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                eprintln!("metrics HTTP server error: {e}");
            }
        });
        eprintln!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Storage backend + ledger
    // ---------------------------

    let backend = JsonFileBackend::new(cfg.storage.clone());
    let log = TransactionLog::open(backend)
        .map_err(|e| format!("failed to open ledger at {}: {e}", cfg.storage.path.display()))?;
    let validator = RuleSet::new(&cfg.rules);
    let svc = ledger::LedgerService::new(log, validator, cfg.rules.clone());

    metrics.ledger.chain_length.set(svc.transaction_count() as i64);

    // ---------------------------
    // Scripted end-to-end flow
    // ---------------------------

    let batch_id = BatchId::new(format!("ASHW-{}", current_unix_millis()));
    info!(batch = %batch_id, "running demo flow");

    // Harvest in Rajasthan, inside the Ashwagandha fence.
    let collection = CollectionEvent {
        batch_id: batch_id.clone(),
        species: "Ashwagandha".to_string(),
        gps: GpsPoint {
            lat: 26.9124,
            lng: 75.7873,
            altitude: Some(431.0),
        },
        harvested_at: current_unix_millis(),
        moisture_pct: 11.2,
        farmer_name: "R. Meena".to_string(),
        farmer_id: "FARM-042".to_string(),
        notes: Some("Morning harvest, roots only".to_string()),
        photo_ref: None,
    };
    let receipt = submit(&svc, &metrics, || svc.submit_collection(collection.clone()))?;
    println!("collection committed: {} ({})", receipt.transaction_id, batch_id);

    // Lab result: clean measurements, status derived server-side.
    let test = QualityTestEvent {
        batch_id: batch_id.clone(),
        dna_marker: "ITS2-7781".to_string(),
        pesticide_ppm: 0.03,
        moisture_pct: 12.5,
        heavy_metals_ppm: Some(0.01),
        lab_name: "AyurLab Jaipur".to_string(),
        lab_id: "LAB-009".to_string(),
        tested_at: current_unix_millis(),
        status: QualityStatus::Passed,
        report_ref: Some("reports/ITS2-7781.pdf".to_string()),
    };
    let receipt = submit(&svc, &metrics, || svc.submit_quality_test(test.clone()))?;
    println!("quality test committed: {}", receipt.transaction_id);

    // Processing: every stage completed, QR issued at packaging.
    let now = current_unix_millis();
    let history: Vec<StageTransition> = ProcessingStage::ALL
        .iter()
        .map(|stage| StageTransition {
            stage: *stage,
            status: StageStatus::Completed,
            at: now,
            by: "PROC-003".to_string(),
        })
        .collect();
    let processing = ProcessingEvent {
        batch_id: batch_id.clone(),
        drying: StageStatus::Completed,
        grinding: StageStatus::Completed,
        packaging: StageStatus::Completed,
        processor_name: "HerbWorks Udaipur".to_string(),
        processor_id: "PROC-003".to_string(),
        history,
        qr_ref: Some(format!("QR-{batch_id}")),
    };
    let receipt = submit(&svc, &metrics, || svc.submit_processing(processing.clone()))?;
    println!("processing committed: {}", receipt.transaction_id);

    // ---------------------------
    // Consumer view
    // ---------------------------

    let bundle = svc
        .get_provenance(&batch_id)
        .map_err(|e| format!("failed to assemble provenance: {e}"))?;
    metrics.ledger.provenance_queries.inc();

    let json = serde_json::to_string_pretty(&bundle)
        .map_err(|e| format!("failed to encode provenance bundle: {e}"))?;
    println!("{json}");

    svc.verify_chain()
        .map_err(|e| format!("chain verification failed: {e}"))?;
    let summary = svc.summary();
    info!(
        transactions = summary.total_transactions,
        batches = summary.batch_count,
        verified = summary.verified_batch_count,
        "chain verified"
    );

    Ok(())
}

/// Runs one submission, recording latency and outcome metrics.
fn submit<F>(
    svc: &ledger::DefaultLedgerService,
    metrics: &MetricsRegistry,
    op: F,
) -> Result<SubmitReceipt, String>
where
    F: FnOnce() -> Result<SubmitReceipt, LedgerError>,
{
    let start = Instant::now();
    match op() {
        Ok(receipt) => {
            metrics.ledger.submit_seconds.observe(start.elapsed().as_secs_f64());
            metrics.ledger.tx_committed.inc();
            metrics.ledger.chain_length.set(svc.transaction_count() as i64);
            Ok(receipt)
        }
        Err(e) => {
            metrics.ledger.tx_rejected.inc();
            Err(format!("submission rejected: {e}"))
        }
    }
}
