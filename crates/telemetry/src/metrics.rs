//! Prometheus metrics for the transaction explorer.

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};

/// Metrics collector shared by the chain client, the classifier and the web layer.
///
/// Each instance owns its registry, so several collectors can coexist in one
/// process (tests build one per case).
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    rpc_latency: HistogramVec,
    rpc_errors: IntCounterVec,
    transactions_inspected: IntCounter,
    records_classified: IntCounterVec,
    classification_failures: IntCounterVec,
    metadata_latency: Histogram,
}

impl Metrics {
    /// Create a new metrics instance with a fresh registry.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let rpc_latency = HistogramVec::new(
            HistogramOpts::new(
                "tx_explorer_rpc_latency_seconds",
                "JSON-RPC call latency in seconds",
            ),
            &["method"],
        )?;
        registry.register(Box::new(rpc_latency.clone()))?;

        let rpc_errors = IntCounterVec::new(
            Opts::new("tx_explorer_rpc_errors_total", "Total number of failed JSON-RPC calls"),
            &["method"],
        )?;
        registry.register(Box::new(rpc_errors.clone()))?;

        let transactions_inspected = IntCounter::new(
            "tx_explorer_transactions_inspected_total",
            "Total number of transactions inspected by the classifier",
        )?;
        registry.register(Box::new(transactions_inspected.clone()))?;

        let records_classified = IntCounterVec::new(
            Opts::new(
                "tx_explorer_records_classified_total",
                "Total number of enriched transfer records produced",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(records_classified.clone()))?;

        let classification_failures = IntCounterVec::new(
            Opts::new(
                "tx_explorer_classification_failures_total",
                "Total number of matching transactions that could not be decoded or enriched",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(classification_failures.clone()))?;

        let metadata_latency = Histogram::with_opts(HistogramOpts::new(
            "tx_explorer_metadata_fetch_latency_seconds",
            "Off-chain NFT metadata fetch latency in seconds",
        ))?;
        registry.register(Box::new(metadata_latency.clone()))?;

        Ok(Self {
            registry,
            rpc_latency,
            rpc_errors,
            transactions_inspected,
            records_classified,
            classification_failures,
            metadata_latency,
        })
    }

    /// Record the latency of one JSON-RPC call.
    pub fn observe_rpc_latency(&self, method: &str, duration_secs: f64) {
        self.rpc_latency.with_label_values(&[method]).observe(duration_secs);
    }

    /// Increment the RPC errors counter.
    pub fn inc_rpc_errors(&self, method: &str) {
        self.rpc_errors.with_label_values(&[method]).inc();
    }

    pub fn inc_transactions_inspected(&self, count: u64) {
        self.transactions_inspected.inc_by(count);
    }

    pub fn inc_records_classified(&self, kind: &str, count: u64) {
        self.records_classified.with_label_values(&[kind]).inc_by(count);
    }

    pub fn inc_classification_failures(&self, kind: &str, count: u64) {
        self.classification_failures.with_label_values(&[kind]).inc_by(count);
    }

    /// Record the latency of one metadata document fetch.
    pub fn observe_metadata_latency(&self, duration_secs: f64) {
        self.metadata_latency.observe(duration_secs);
    }

    /// Get the metrics in the Prometheus text exposition format.
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
