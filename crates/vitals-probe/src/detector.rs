use vitals_core_types::Millis;

/// A frame gap longer than this counts as a long task.
pub const LONG_TASK_THRESHOLD_MS: Millis = 50;
/// Sustained long-task-free span required to declare interactivity.
pub const QUIET_PERIOD_MS: Millis = 1_000;
pub const MIN_INTERVAL_MS: Millis = 1;
pub const MAX_INTERVAL_MS: Millis = 25;
/// Interval stops growing exponentially at this point and steps by one.
const LINEAR_GROWTH_FROM_MS: Millis = 16;
/// A tick that fired within this much of the requested delay counts as
/// "on time" and lets the interval grow.
const ON_TIME_SLACK_MS: i64 = 10;

/// Detector phase. `Done` is terminal; a restart re-enters `Armed`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DetectorState {
    Armed,
    Checking,
    Done,
}

/// Outcome of one detector tick.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tick {
    /// Stay in `Checking`; fire the next tick after `delay_ms`.
    Reschedule { delay_ms: Millis },
    /// Quiet period confirmed or session budget exhausted.
    Done { tti: Millis },
}

/// Adaptive polling loop that watches for a sustained long-task-free
/// period on the (single-threaded) execution context.
///
/// The poll interval follows a congestion-control-style schedule: it grows
/// while ticks fire on time (doubling below 16 ms, then by 1 ms up to 25)
/// and halves after a long task, keeping polling frequent right after jank
/// and cheap during calm stretches. The driver owns the actual timer; at
/// most one tick is outstanding, and `restart` discards all frame-timing
/// history so TTI is always measured relative to the latest FMP.
pub struct IdleDetector {
    session_duration_ms: Millis,
    state: DetectorState,
    interval_ms: Millis,
    start_time: Option<Millis>,
    last_frame_time: Option<Millis>,
    last_long_task_time: Option<Millis>,
}

impl IdleDetector {
    pub fn new(session_duration_ms: Millis) -> Self {
        Self {
            session_duration_ms,
            state: DetectorState::Armed,
            interval_ms: MIN_INTERVAL_MS,
            start_time: None,
            last_frame_time: None,
            last_long_task_time: None,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn interval_ms(&self) -> Millis {
        self.interval_ms
    }

    /// Re-arm the loop at elapsed time `now`, discarding frame-timing
    /// history (the adaptive interval survives restarts). Returns the
    /// delay until the first check, or `None` once the detector is done.
    pub fn restart(&mut self, now: Millis) -> Option<Millis> {
        if self.state == DetectorState::Done {
            return None;
        }
        self.state = DetectorState::Armed;
        self.start_time = None;
        self.last_frame_time = None;
        self.last_long_task_time = None;
        Some(self.schedule(now))
    }

    /// Process one timer fire at elapsed time `now`.
    pub fn tick(&mut self, now: Millis) -> Tick {
        if self.state == DetectorState::Done {
            return Tick::Done {
                tti: self.last_long_task_time.unwrap_or(now),
            };
        }
        self.state = DetectorState::Checking;

        let last_frame = self.last_frame_time.unwrap_or(now);
        let task_time = now.saturating_sub(last_frame);

        if (task_time as i64 - self.interval_ms as i64) < ON_TIME_SLACK_MS {
            self.interval_ms = if self.interval_ms < LINEAR_GROWTH_FROM_MS {
                self.interval_ms * 2
            } else {
                self.interval_ms + 1
            }
            .min(MAX_INTERVAL_MS);
        } else if task_time > LONG_TASK_THRESHOLD_MS {
            self.interval_ms = (self.interval_ms / 2).max(MIN_INTERVAL_MS);
        }

        if task_time > LONG_TASK_THRESHOLD_MS {
            self.last_long_task_time = Some(now);
        }
        let last_long_task = self.last_long_task_time.unwrap_or(now);

        if now.saturating_sub(last_long_task) > QUIET_PERIOD_MS || now > self.session_duration_ms {
            self.state = DetectorState::Done;
            Tick::Done { tti: last_long_task }
        } else {
            Tick::Reschedule {
                delay_ms: self.schedule(now),
            }
        }
    }

    /// Mark the schedule instant and first-tick reference marks; returns
    /// the delay until the next check.
    fn schedule(&mut self, now: Millis) -> Millis {
        self.last_frame_time = Some(now);
        if self.start_time.is_none() {
            self.start_time = Some(now);
            self.last_long_task_time = Some(now);
        }
        self.interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the detector with a fixed extra latency per tick, returning
    /// the elapsed time and outcome when it completes, or `None` after
    /// `max_ticks`.
    fn run(
        detector: &mut IdleDetector,
        start: Millis,
        lag_ms: Millis,
        max_ticks: usize,
    ) -> Option<(Millis, Millis)> {
        let mut now = start;
        let mut delay = detector.restart(now).unwrap();
        for _ in 0..max_ticks {
            now += delay + lag_ms;
            match detector.tick(now) {
                Tick::Done { tti } => return Some((now, tti)),
                Tick::Reschedule { delay_ms } => delay = delay_ms,
            }
        }
        None
    }

    #[test]
    fn quiet_context_declares_tti_at_arm_time() {
        let mut detector = IdleDetector::new(10_000);
        let (_, tti) = run(&mut detector, 120, 0, 10_000).unwrap();
        // No long task ever fired, so TTI is the arming instant.
        assert_eq!(tti, 120);
        assert_eq!(detector.state(), DetectorState::Done);
    }

    #[test]
    fn interval_grows_doubling_then_linear() {
        let mut detector = IdleDetector::new(100_000);
        let mut now = 0;
        let mut delay = detector.restart(now).unwrap();
        let mut seen = vec![detector.interval_ms()];
        for _ in 0..12 {
            now += delay;
            match detector.tick(now) {
                Tick::Reschedule { delay_ms } => delay = delay_ms,
                Tick::Done { .. } => break,
            }
            seen.push(detector.interval_ms());
        }
        assert!(seen.starts_with(&[1, 2, 4, 8, 16, 17, 18]));
        assert!(seen.iter().all(|&i| (1..=25).contains(&i)));
    }

    #[test]
    fn interval_caps_at_maximum() {
        let mut detector = IdleDetector::new(u64::MAX);
        let mut now = 0;
        let mut delay = detector.restart(now).unwrap();
        for _ in 0..50 {
            now += delay;
            match detector.tick(now) {
                Tick::Reschedule { delay_ms } => delay = delay_ms,
                Tick::Done { .. } => break,
            }
        }
        assert_eq!(detector.interval_ms(), MAX_INTERVAL_MS);
    }

    #[test]
    fn long_tasks_halve_interval_and_block_termination() {
        // Scenario D: every tick arrives 60 ms late, so a long task is
        // recorded each time and no quiet second ever accumulates; the
        // loop only ends via the session budget.
        let mut detector = IdleDetector::new(2_000);
        let (now, tti) = run(&mut detector, 0, 60, 10_000).unwrap();
        assert!(now > 2_000);
        assert_eq!(detector.interval_ms(), MIN_INTERVAL_MS);
        // TTI lands on the last long task, i.e. the final tick.
        assert_eq!(tti, now);
    }

    #[test]
    fn interval_stays_bounded_under_mixed_load() {
        let mut detector = IdleDetector::new(u64::MAX);
        let mut now = 0;
        let mut delay = detector.restart(now).unwrap();
        for i in 0..500 {
            let lag = if i % 3 == 0 { 70 } else { 0 };
            now += delay + lag;
            match detector.tick(now) {
                Tick::Reschedule { delay_ms } => delay = delay_ms,
                Tick::Done { .. } => break,
            }
            let interval = detector.interval_ms();
            assert!((MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&interval));
        }
    }

    #[test]
    fn restart_discards_frame_history_but_keeps_interval() {
        let mut detector = IdleDetector::new(100_000);
        let mut now = 0;
        let mut delay = detector.restart(now).unwrap();
        for _ in 0..6 {
            now += delay;
            if let Tick::Reschedule { delay_ms } = detector.tick(now) {
                delay = delay_ms;
            }
        }
        let grown = detector.interval_ms();
        assert!(grown > MIN_INTERVAL_MS);

        detector.restart(5_000);
        assert_eq!(detector.state(), DetectorState::Armed);
        assert_eq!(detector.interval_ms(), grown);
        // Quiet period now counts from the restart instant.
        let (_, tti) = run(&mut detector, 5_000, 0, 10_000).unwrap();
        assert_eq!(tti, 5_000);
    }

    #[test]
    fn restart_after_done_is_a_no_op() {
        let mut detector = IdleDetector::new(10_000);
        run(&mut detector, 0, 0, 10_000).unwrap();
        assert_eq!(detector.state(), DetectorState::Done);
        assert!(detector.restart(9_000).is_none());
    }

    #[test]
    fn session_budget_terminates_busy_loop() {
        let mut detector = IdleDetector::new(300);
        let outcome = run(&mut detector, 0, 60, 10_000);
        assert!(outcome.is_some());
    }
}
