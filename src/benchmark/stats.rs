//! Per-phase latency statistics

use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use serde::Serialize;

/// Latency and throughput summary for one benchmark phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseResult {
    pub phase: String,
    /// Rows delivered by the loader during the phase
    pub operations: u64,
    pub errors: u64,
    pub elapsed_secs: f64,
    pub ops_per_sec: f64,
    pub p50_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
    /// Mean recall@k against ground-truth neighbors (search phase only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recall: Option<f64>,
}

/// Accumulates per-operation latencies for one phase
pub struct PhaseStats {
    name: String,
    histogram: Histogram<u64>,
    started: Instant,
}

impl PhaseStats {
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            // Microsecond latencies up to one hour, 3 significant digits
            histogram: Histogram::new_with_bounds(1, 3_600_000_000, 3)
                .expect("Failed to create histogram"),
            started: Instant::now(),
        }
    }

    pub fn record(&mut self, latency: Duration) {
        let micros = latency.as_micros().min(u128::from(u64::MAX)) as u64;
        self.histogram.saturating_record(micros.max(1));
    }

    pub fn finish(self, operations: u64, errors: u64) -> PhaseResult {
        let elapsed_secs = self.started.elapsed().as_secs_f64();
        PhaseResult {
            phase: self.name,
            operations,
            errors,
            elapsed_secs,
            ops_per_sec: if elapsed_secs > 0.0 {
                operations as f64 / elapsed_secs
            } else {
                0.0
            },
            p50_us: self.histogram.value_at_quantile(0.50),
            p99_us: self.histogram.value_at_quantile(0.99),
            max_us: self.histogram.max(),
            recall: None,
        }
    }
}
