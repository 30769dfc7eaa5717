use serde::{Deserialize, Serialize};
use vitals_core_types::Millis;

/// Overall session budget for whole-document measurement.
pub const DEFAULT_DOCUMENT_DURATION_MS: Millis = 10_000;
/// Overall session budget for scoped-node measurement.
pub const DEFAULT_NODE_DURATION_MS: Millis = 5_000;
/// Paint events closer together than this are treated as one rendering
/// burst when selecting FMP.
pub const DEFAULT_MEANINGFULNESS_WINDOW_MS: Millis = 50;
/// Initial visible viewport height assumed when the caller gives none.
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 900.0;

/// Tunables for one measurement session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MeasureOptions {
    /// Overall session budget in ms. `None` picks the mode default
    /// (10 000 ms whole-document, 5 000 ms scoped-node).
    pub duration_ms: Option<Millis>,
    /// FMP grouping window in ms.
    pub meaningfulness_window_ms: Millis,
    /// Height of the initially visible viewport; content entirely below
    /// it scores zero.
    pub viewport_height: f64,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        Self {
            duration_ms: None,
            meaningfulness_window_ms: DEFAULT_MEANINGFULNESS_WINDOW_MS,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
        }
    }
}

impl MeasureOptions {
    pub fn duration_or(&self, default: Millis) -> Millis {
        self.duration_ms.unwrap_or(default)
    }
}
