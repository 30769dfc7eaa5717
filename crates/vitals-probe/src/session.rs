use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use vitals_core_types::{Clock, Millis, SessionId};

use crate::detector::{IdleDetector, Tick};
use crate::events;
use crate::history::ScoreHistory;
use crate::model::{MutationEvent, SpeedReport};
use crate::policy::MeasureOptions;
use crate::scorer::SubtreeScorer;

/// One measurement session: owns the scorer, the score history, and the
/// interactivity detector, and folds mutation batches and detector ticks
/// into the final `{fcp, fmp, tti}` triple.
///
/// All mutation happens synchronously inside `on_event`/`on_tick`, driven
/// by a single event loop, so the internal structures never see concurrent
/// access.
pub struct RenderSession {
    id: SessionId,
    clock: Arc<dyn Clock>,
    /// Clock reading at session start; elapsed time is measured from here.
    origin: Millis,
    duration_ms: Millis,
    scorer: SubtreeScorer,
    history: ScoreHistory,
    detector: IdleDetector,
    enabled: bool,
    ended: bool,
    result: Option<SpeedReport>,
    /// Absolute elapsed time of the next detector check, if one is armed.
    next_tick_at: Option<Millis>,
}

impl RenderSession {
    /// Session measured relative to call time (scoped-node mode).
    pub fn new(
        clock: Arc<dyn Clock>,
        options: &MeasureOptions,
        duration_ms: Millis,
        enabled: bool,
    ) -> Self {
        let origin = clock.now_ms();
        Self::with_origin(clock, options, duration_ms, enabled, origin)
    }

    /// Session measured relative to the clock's own reference point, i.e.
    /// navigation start (whole-document mode).
    pub fn from_navigation_start(
        clock: Arc<dyn Clock>,
        options: &MeasureOptions,
        duration_ms: Millis,
        enabled: bool,
    ) -> Self {
        Self::with_origin(clock, options, duration_ms, enabled, 0)
    }

    fn with_origin(
        clock: Arc<dyn Clock>,
        options: &MeasureOptions,
        duration_ms: Millis,
        enabled: bool,
        origin: Millis,
    ) -> Self {
        let mut detector = IdleDetector::new(duration_ms);
        let next_tick_at = if enabled { detector.restart(0) } else { None };
        Self {
            id: SessionId::new(),
            clock,
            origin,
            duration_ms,
            scorer: SubtreeScorer::new(options.viewport_height),
            history: ScoreHistory::new(options.meaningfulness_window_ms),
            detector,
            enabled,
            // A disabled session never observes content; it only waits out
            // its budget and degrades.
            ended: !enabled,
            result: None,
            next_tick_at,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn duration_ms(&self) -> Millis {
        self.duration_ms
    }

    pub fn result(&self) -> Option<SpeedReport> {
        self.result
    }

    pub fn fcp_time(&self) -> Option<Millis> {
        self.history.fcp_time()
    }

    pub fn fmp_time(&self) -> Option<Millis> {
        self.history.fmp_time()
    }

    pub fn next_tick_at(&self) -> Option<Millis> {
        self.next_tick_at
    }

    /// Elapsed ms since session start.
    pub fn elapsed(&self) -> Millis {
        self.clock.now_ms().saturating_sub(self.origin)
    }

    /// Fold one mutation-feed event into the session.
    pub fn on_event(&mut self, event: MutationEvent) {
        if !self.enabled || self.ended {
            return;
        }
        match event {
            MutationEvent::ChildListChanged { added, root_ready } => {
                // Notifications can race root initialization; scoring only
                // starts once the watched root exists.
                if !root_ready {
                    return;
                }
                let started = Instant::now();
                let delta = self.scorer.score_nodes(&added);
                self.record(delta, started.elapsed());
            }
            MutationEvent::ImageLoaded { node } => {
                let started = Instant::now();
                if let Some(delta) = self.scorer.complete_image(&node) {
                    self.record(delta, started.elapsed());
                }
            }
        }
    }

    /// Run one detector check; fires when `next_tick_at` is reached.
    pub fn on_tick(&mut self) {
        if self.ended {
            self.next_tick_at = None;
            return;
        }
        let now = self.elapsed();
        match self.detector.tick(now) {
            Tick::Reschedule { delay_ms } => {
                self.next_tick_at = Some(now + delay_ms);
            }
            Tick::Done { tti } => {
                self.next_tick_at = None;
                self.finalize(tti);
            }
        }
    }

    fn record(&mut self, delta: u32, took: Duration) {
        let now = self.elapsed();
        if delta == 0 {
            events::emit_batch_dropped(&self.id, now, took);
            return;
        }
        if let Some(outcome) = self.history.add_score(delta, now) {
            events::emit_score_batch(&self.id, delta, now, outcome.first_paint, took);
            if outcome.fmp_advanced {
                let window_score = self.history.fmp().map(|p| p.m).unwrap_or(0);
                events::emit_fmp_advance(&self.id, now, window_score);
                // A later, more meaningful paint invalidates any
                // interactivity measurement already in progress.
                if let Some(delay) = self.detector.restart(now) {
                    events::emit_detector_restart(&self.id, now);
                    self.next_tick_at = Some(now + delay);
                }
            }
        }
    }

    /// Build the final triple. Exactly once: later calls return the stored
    /// result unchanged.
    pub fn finalize(&mut self, tti: Millis) -> SpeedReport {
        if let Some(report) = self.result {
            return report;
        }
        self.ended = true;
        self.next_tick_at = None;
        self.scorer.release_pending();
        let report = SpeedReport {
            fcp: self.history.fcp_time().unwrap_or(tti),
            fmp: self.history.fmp_time().unwrap_or(tti),
            tti,
        };
        self.result = Some(report);
        events::emit_session_done(&self.id, &report, !self.enabled);
        report
    }
}

/// Drive a session to the end of its budget over a single event loop:
/// mutation events, detector ticks, and the session deadline are the only
/// suspension points, and at most one detector tick is outstanding.
///
/// An early quiet-period detection finalizes the triple but does not end
/// the loop; the session always runs out its budget (the caller decides
/// what the surrounding promise does). Cancellation stops the loop
/// immediately.
pub async fn drive(
    session: &mut RenderSession,
    mut feed_rx: Option<mpsc::Receiver<MutationEvent>>,
    cancel: &CancellationToken,
) -> SpeedReport {
    let mut feed_open = feed_rx.is_some();
    let budget_left = session.duration_ms().saturating_sub(session.elapsed());
    let deadline = tokio::time::Instant::now() + Duration::from_millis(budget_left);
    loop {
        let now = session.elapsed();
        if now >= session.duration_ms() {
            break;
        }
        let tick_in = session
            .next_tick_at()
            .map(|at| at.saturating_sub(now))
            .filter(|_| !session.ended());

        select! {
            _ = cancel.cancelled() => {
                debug!(target: "vitals.session", session = %session.id(), "session cancelled");
                break;
            }
            _ = tokio::time::sleep_until(deadline) => {
                break;
            }
            _ = sleep(Duration::from_millis(tick_in.unwrap_or(0))), if tick_in.is_some() => {
                session.on_tick();
            }
            event = async {
                match feed_rx.as_mut() {
                    Some(rx) => rx.recv().await,
                    None => None,
                }
            }, if feed_open => {
                match event {
                    Some(event) => session.on_event(event),
                    None => {
                        // Feed closed; keep waiting out the budget.
                        feed_open = false;
                    }
                }
            }
        }
    }
    let elapsed = session.elapsed();
    session.finalize(elapsed)
}
