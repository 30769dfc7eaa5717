//! Telemetry helpers for the render probe.
//!
//! Lightweight process-wide counters + latency aggregates so embedders can
//! surface basic numbers without depending on an external metrics backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

static BATCHES_SCORED: AtomicU64 = AtomicU64::new(0);
static BATCHES_DROPPED: AtomicU64 = AtomicU64::new(0);
static POINTS_RECORDED: AtomicU64 = AtomicU64::new(0);
static SCORE_TOTAL: AtomicU64 = AtomicU64::new(0);
static SCORE_LAT_NS: AtomicU64 = AtomicU64::new(0);
static SCORE_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

static FMP_ADVANCES: AtomicU64 = AtomicU64::new(0);
static DETECTOR_RESTARTS: AtomicU64 = AtomicU64::new(0);

static SESSIONS_COMPLETED: AtomicU64 = AtomicU64::new(0);
static SESSIONS_DEGRADED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScoreMetric {
    pub batches: u64,
    pub dropped: u64,
    pub points: u64,
    pub avg_delta: f64,
    pub avg_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub score: ScoreMetric,
    pub fmp_advances: u64,
    pub detector_restarts: u64,
    pub sessions_completed: u64,
    pub sessions_degraded: u64,
}

/// Record one scored mutation batch. Zero-delta batches count toward
/// `dropped`; positive batches become history points.
pub fn record_batch(delta: u32, duration: Duration) {
    BATCHES_SCORED.fetch_add(1, Ordering::Relaxed);
    if delta == 0 {
        BATCHES_DROPPED.fetch_add(1, Ordering::Relaxed);
    } else {
        POINTS_RECORDED.fetch_add(1, Ordering::Relaxed);
        SCORE_TOTAL.fetch_add(delta as u64, Ordering::Relaxed);
    }
    record_latency(&SCORE_LAT_NS, &SCORE_LAT_SAMPLES, duration);
}

pub fn record_fmp_advance() {
    FMP_ADVANCES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_detector_restart() {
    DETECTOR_RESTARTS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_session(degraded: bool) {
    SESSIONS_COMPLETED.fetch_add(1, Ordering::Relaxed);
    if degraded {
        SESSIONS_DEGRADED.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn snapshot() -> MetricSnapshot {
    let points = POINTS_RECORDED.load(Ordering::Relaxed);
    let total = SCORE_TOTAL.load(Ordering::Relaxed);
    let avg_delta = if points == 0 {
        0.0
    } else {
        total as f64 / points as f64
    };
    MetricSnapshot {
        score: ScoreMetric {
            batches: BATCHES_SCORED.load(Ordering::Relaxed),
            dropped: BATCHES_DROPPED.load(Ordering::Relaxed),
            points,
            avg_delta,
            avg_ms: make_avg_ms(
                SCORE_LAT_NS.load(Ordering::Relaxed),
                SCORE_LAT_SAMPLES.load(Ordering::Relaxed),
            ),
        },
        fmp_advances: FMP_ADVANCES.load(Ordering::Relaxed),
        detector_restarts: DETECTOR_RESTARTS.load(Ordering::Relaxed),
        sessions_completed: SESSIONS_COMPLETED.load(Ordering::Relaxed),
        sessions_degraded: SESSIONS_DEGRADED.load(Ordering::Relaxed),
    }
}

fn make_avg_ms(nanos: u64, samples: u64) -> f64 {
    if samples == 0 {
        0.0
    } else {
        (nanos as f64 / samples as f64) / 1_000_000.0
    }
}

fn record_latency(total_ns: &AtomicU64, samples: &AtomicU64, duration: Duration) {
    let nanos = duration_to_nanos(duration);
    total_ns.fetch_add(nanos, Ordering::Relaxed);
    samples.fetch_add(1, Ordering::Relaxed);
}

fn duration_to_nanos(duration: Duration) -> u64 {
    let nanos = duration.as_nanos();
    if nanos > u64::MAX as u128 {
        u64::MAX
    } else {
        nanos as u64
    }
}
