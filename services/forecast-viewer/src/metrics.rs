//! Request metrics.
//!
//! Counters go to the `metrics` facade (exported at `/metrics` when a
//! Prometheus recorder is installed) and are mirrored in atomics so the
//! JSON stats endpoint works without one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;

use forecast_common::Severity;

#[derive(Debug, Default)]
struct TimingStats {
    count: u64,
    total_us: u64,
    min_us: u64,
    max_us: u64,
    last_us: u64,
}

impl TimingStats {
    fn record(&mut self, duration_us: u64) {
        self.count += 1;
        self.total_us += duration_us;
        self.last_us = duration_us;
        if self.min_us == 0 || duration_us < self.min_us {
            self.min_us = duration_us;
        }
        if duration_us > self.max_us {
            self.max_us = duration_us;
        }
    }

    fn avg_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.total_us as f64 / self.count as f64) / 1000.0
        }
    }
}

/// Counters for the render endpoint.
#[derive(Debug)]
pub struct MetricsCollector {
    pub requests: AtomicU64,
    pub warnings: AtomicU64,
    pub errors: AtomicU64,
    render_times: Mutex<TimingStats>,
    start_time: Instant,
}

/// Point-in-time view of [`MetricsCollector`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub requests: u64,
    pub warnings: u64,
    pub errors: u64,
    pub renders: u64,
    pub render_avg_ms: f64,
    pub render_last_ms: f64,
    pub render_min_ms: f64,
    pub render_max_ms: f64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            warnings: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            render_times: Mutex::new(TimingStats::default()),
            start_time: Instant::now(),
        }
    }

    pub fn record_request(&self, parameter: &str) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        counter!("forecast_requests_total", "parameter" => parameter.to_string()).increment(1);
    }

    pub fn record_failure(&self, severity: Severity) {
        match severity {
            Severity::Warning => self.warnings.fetch_add(1, Ordering::Relaxed),
            Severity::Error => self.errors.fetch_add(1, Ordering::Relaxed),
        };
        counter!("forecast_request_errors_total", "severity" => severity.as_str()).increment(1);
    }

    pub fn record_render(&self, duration_us: u64) {
        histogram!("render_duration_ms").record(duration_us as f64 / 1000.0);
        if let Ok(mut times) = self.render_times.lock() {
            times.record(duration_us);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let (renders, avg, last, min, max) = match self.render_times.lock() {
            Ok(t) => (
                t.count,
                t.avg_ms(),
                t.last_us as f64 / 1000.0,
                t.min_us as f64 / 1000.0,
                t.max_us as f64 / 1000.0,
            ),
            Err(_) => (0, 0.0, 0.0, 0.0, 0.0),
        };
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            requests: self.requests.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            renders,
            render_avg_ms: avg,
            render_last_ms: last,
            render_min_ms: min,
            render_max_ms: max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let metrics = MetricsCollector::new();
        metrics.record_request("tmp2m");
        metrics.record_request("tmp2m");
        metrics.record_failure(Severity::Warning);
        metrics.record_render(2_000);
        metrics.record_render(4_000);

        let snap = metrics.snapshot();
        assert_eq!(snap.requests, 2);
        assert_eq!(snap.warnings, 1);
        assert_eq!(snap.errors, 0);
        assert_eq!(snap.renders, 2);
        assert_eq!(snap.render_avg_ms, 3.0);
        assert_eq!(snap.render_min_ms, 2.0);
        assert_eq!(snap.render_max_ms, 4.0);
    }
}
