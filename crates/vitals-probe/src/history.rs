use vitals_core_types::Millis;

use crate::model::{PointId, ScorePoint};

/// Outcome of recording one positive score delta.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScoreOutcome {
    pub point: PointId,
    /// This delta produced the session's first contentful paint.
    pub first_paint: bool,
    /// The FMP selection moved to a different point; the interactivity
    /// detector must be restarted.
    pub fmp_advanced: bool,
}

/// Append-only, time-pruned history of render-score events plus the
/// FCP/FMP selection over it.
///
/// Points live in a growable arena and the backward chain is the index
/// order; pruning advances a retention boundary instead of unlinking, so a
/// pruned point stays addressable while it is still referenced as FCP or
/// FMP. Memory is bounded by the arena, which in turn is bounded by the
/// session duration (one point per positive batch).
pub struct ScoreHistory {
    window_ms: Millis,
    points: Vec<ScorePoint>,
    /// Index of the oldest point still inside the meaningfulness window.
    retained: usize,
    fcp: Option<PointId>,
    fmp: Option<PointId>,
}

impl ScoreHistory {
    pub fn new(window_ms: Millis) -> Self {
        Self {
            window_ms,
            points: Vec::new(),
            retained: 0,
            fcp: None,
            fmp: None,
        }
    }

    /// Record a score delta observed at elapsed time `t` and re-evaluate
    /// the FMP selection. Zero deltas are dropped without creating a
    /// point. `t` must be monotone across calls.
    ///
    /// Within the window the point with the largest individual delta is
    /// preferred as the FMP candidate over the point completing the
    /// largest cumulative score; the cumulative score is what gets
    /// compared against (and written as) the candidate's `m`. Heuristic
    /// carried over deliberately: it favors one large rendering event
    /// over many small ones accumulating around it.
    pub fn add_score(&mut self, delta: u32, t: Millis) -> Option<ScoreOutcome> {
        if delta == 0 {
            return None;
        }
        debug_assert!(
            self.points.last().map_or(true, |last| last.t <= t),
            "score events must arrive in time order"
        );

        let id = PointId(self.points.len());
        self.points.push(ScorePoint { t, s: delta, m: 0 });

        let first_paint = self.fcp.is_none();
        if first_paint {
            self.fcp = Some(id);
        }

        let mut target = id;
        let mut window_score = delta;
        let mut idx = id.0;
        while idx > self.retained {
            idx -= 1;
            let point = self.points[idx];
            if t - point.t > self.window_ms {
                // Severed link: everything at and before idx leaves the
                // window for good.
                self.retained = idx + 1;
                break;
            }
            window_score += point.s;
            if point.s > self.points[target.0].s {
                target = PointId(idx);
            }
        }

        let prior_best = self.fmp.map(|id| self.points[id.0].m).unwrap_or(0);
        let mut fmp_advanced = false;
        if window_score >= prior_best {
            self.points[target.0].m = window_score;
            if self.fmp != Some(target) {
                self.fmp = Some(target);
                fmp_advanced = true;
            }
        }

        Some(ScoreOutcome {
            point: id,
            first_paint,
            fmp_advanced,
        })
    }

    pub fn fcp(&self) -> Option<ScorePoint> {
        self.fcp.map(|id| self.points[id.0])
    }

    pub fn fmp(&self) -> Option<ScorePoint> {
        self.fmp.map(|id| self.points[id.0])
    }

    pub fn fcp_time(&self) -> Option<Millis> {
        self.fcp().map(|p| p.t)
    }

    pub fn fmp_time(&self) -> Option<Millis> {
        self.fmp().map(|p| p.t)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points still inside the meaningfulness window, oldest first.
    pub fn retained(&self) -> &[ScorePoint] {
        &self.points[self.retained..]
    }
}
