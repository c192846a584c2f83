//! Prometheus metrics exporter for scan monitoring.
//!
//! Mirrors [`ScanStats`](crate::sampler::ScanStats) into a Prometheus
//! registry. With the `metrics` feature the registry is served over HTTP.
//!
//! # Metrics Exposed
//!
//! ## Session Metrics
//! - `hybrid_scanner_scanning` - Session status (1=scanning, 0=stopped)
//! - `hybrid_scanner_ticks_total` - Scan loop ticks processed
//! - `hybrid_scanner_skipped_ticks_total` - Ticks skipped waiting for a frame
//! - `hybrid_scanner_frames_total` - Frames captured and decoded
//!
//! ## Recovery Metrics
//! - `hybrid_scanner_recovery_attempts_total` - Recovery attempts on fused pairs
//! - `hybrid_scanner_recovery_failures_total{kind}` - Failed attempts by kind
//!   (`malformed`, `crypto`, `rejected`)
//! - `hybrid_scanner_secrets_found_total` - Secrets recovered
//! - `hybrid_scanner_batch_size` - Results held by the current session
//!
//! # Example
//!
//! ```no_run
//! use hybrid_scanner::metrics::{MetricsRegistry, MetricsSnapshot};
//! use hybrid_scanner::sampler::ScanStats;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let stats = ScanStats {
//!     scanning: true,
//!     ticks: 120,
//!     frames: 118,
//!     recovery_attempts: 2,
//!     secrets_found: 1,
//!     results: 1,
//!     ..ScanStats::default()
//! };
//!
//! registry.update(&MetricsSnapshot::from_stats(&stats));
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
