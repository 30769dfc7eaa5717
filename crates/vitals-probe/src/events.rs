use std::time::Duration;

use tracing::debug;
use vitals_core_types::{Millis, SessionId};

use crate::metrics;
use crate::model::SpeedReport;

pub fn emit_score_batch(
    session: &SessionId,
    delta: u32,
    t: Millis,
    first_paint: bool,
    took: Duration,
) {
    metrics::record_batch(delta, took);
    debug!(
        target: "vitals.events",
        %session,
        delta,
        t,
        first_paint,
        "render.score.recorded"
    );
}

pub fn emit_batch_dropped(session: &SessionId, t: Millis, took: Duration) {
    metrics::record_batch(0, took);
    debug!(target: "vitals.events", %session, t, "render.score.dropped");
}

pub fn emit_fmp_advance(session: &SessionId, t: Millis, window_score: u32) {
    metrics::record_fmp_advance();
    debug!(
        target: "vitals.events",
        %session,
        t,
        window_score,
        "render.fmp.advanced"
    );
}

pub fn emit_detector_restart(session: &SessionId, t: Millis) {
    metrics::record_detector_restart();
    debug!(target: "vitals.events", %session, t, "interactivity.detector.restarted");
}

pub fn emit_session_done(session: &SessionId, report: &SpeedReport, degraded: bool) {
    metrics::record_session(degraded);
    debug!(
        target: "vitals.events",
        %session,
        fcp = report.fcp,
        fmp = report.fmp,
        tti = report.tti,
        degraded,
        "session.finalized"
    );
}
