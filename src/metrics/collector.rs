//! Metrics collection and registry.

use crate::sampler::ScanStats;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of scanner state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether a session is currently scanning.
    pub scanning: bool,
    /// Ticks processed.
    pub ticks: u64,
    /// Ticks skipped for lack of a full frame.
    pub skipped_ticks: u64,
    /// Frames captured and decoded.
    pub frames: u64,
    /// Recovery attempts started.
    pub recovery_attempts: u64,
    /// Attempts dropped for a malformed matrix payload.
    pub malformed_payloads: u64,
    /// Attempts dropped in key derivation or decryption.
    pub crypto_failures: u64,
    /// Attempts whose plaintext was too short.
    pub rejected_plaintexts: u64,
    /// Secrets recovered.
    pub secrets_found: u64,
    /// Results currently held by the session.
    pub batch_size: usize,
}

/// Prometheus metrics registry for scanner monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Session metrics
    scanning: IntGauge,
    ticks_total: IntCounter,
    skipped_ticks_total: IntCounter,
    frames_total: IntCounter,

    // Recovery metrics
    recovery_attempts_total: IntCounter,
    recovery_failures_total: IntCounterVec,
    secrets_found_total: IntCounter,
    batch_size: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all scanner metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let scanning = IntGauge::new(
            "hybrid_scanner_scanning",
            "Whether a scan session is active (1=scanning, 0=stopped)",
        )?;
        let ticks_total = IntCounter::new("hybrid_scanner_ticks_total", "Total scan loop ticks processed")?;
        let skipped_ticks_total = IntCounter::new(
            "hybrid_scanner_skipped_ticks_total",
            "Ticks skipped because the source had no full frame",
        )?;
        let frames_total = IntCounter::new("hybrid_scanner_frames_total", "Total frames captured and decoded")?;

        let recovery_attempts_total = IntCounter::new(
            "hybrid_scanner_recovery_attempts_total",
            "Total recovery attempts on fused payload pairs",
        )?;
        let recovery_failures_total = IntCounterVec::new(
            Opts::new(
                "hybrid_scanner_recovery_failures_total",
                "Recovery attempts that produced no secret, by failure kind",
            ),
            &["kind"],
        )?;
        let secrets_found_total = IntCounter::new("hybrid_scanner_secrets_found_total", "Total secrets recovered")?;
        let batch_size = IntGauge::new("hybrid_scanner_batch_size", "Results held by the current session")?;

        registry.register(Box::new(scanning.clone()))?;
        registry.register(Box::new(ticks_total.clone()))?;
        registry.register(Box::new(skipped_ticks_total.clone()))?;
        registry.register(Box::new(frames_total.clone()))?;
        registry.register(Box::new(recovery_attempts_total.clone()))?;
        registry.register(Box::new(recovery_failures_total.clone()))?;
        registry.register(Box::new(secrets_found_total.clone()))?;
        registry.register(Box::new(batch_size.clone()))?;

        Ok(Self {
            registry,
            scanning,
            ticks_total,
            skipped_ticks_total,
            frames_total,
            recovery_attempts_total,
            recovery_failures_total,
            secrets_found_total,
            batch_size,
        })
    }

    /// Updates all metrics from a snapshot of scanner state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.scanning.set(if snapshot.scanning { 1 } else { 0 });
        self.batch_size.set(snapshot.batch_size as i64);

        // Counters only move forward; apply the difference.
        advance(&self.ticks_total, snapshot.ticks);
        advance(&self.skipped_ticks_total, snapshot.skipped_ticks);
        advance(&self.frames_total, snapshot.frames);
        advance(&self.recovery_attempts_total, snapshot.recovery_attempts);
        advance(&self.secrets_found_total, snapshot.secrets_found);

        for (kind, total) in [
            ("malformed", snapshot.malformed_payloads),
            ("crypto", snapshot.crypto_failures),
            ("rejected", snapshot.rejected_plaintexts),
        ] {
            advance(&self.recovery_failures_total.with_label_values(&[kind]), total);
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from session counters.
    pub fn from_stats(stats: &ScanStats) -> Self {
        Self {
            scanning: stats.scanning,
            ticks: stats.ticks,
            skipped_ticks: stats.skipped_ticks,
            frames: stats.frames,
            recovery_attempts: stats.recovery_attempts,
            malformed_payloads: stats.malformed_payloads,
            crypto_failures: stats.crypto_failures,
            rejected_plaintexts: stats.rejected_plaintexts,
            secrets_found: stats.secrets_found,
            batch_size: stats.results,
        }
    }
}
