use async_trait::async_trait;

use crate::errors::ProbeError;
use crate::model::{DocumentReport, SpeedReport};
use crate::policy::MeasureOptions;

/// Public surface of the render-quality probe.
#[async_trait]
pub trait RenderVitals: Send + Sync {
    /// Measure the whole document from navigation start. Always produces a
    /// report: the session runs out its full budget (default 10 000 ms),
    /// an early quiet-period detection only shortens the `tti` value, and
    /// an unsupported host degrades to an elapsed-time triple with empty
    /// navigation timing.
    async fn measure_document(&self, options: MeasureOptions) -> DocumentReport;

    /// Measure the watched subtree for the given duration (default
    /// 5 000 ms), with all times relative to call time. Fails with
    /// [`ProbeError::NoContentObserved`] when the subtree never produced a
    /// scoring insertion, and with [`ProbeError::Unsupported`] when the
    /// host lacks structural-change notifications.
    async fn measure_node(&self, options: MeasureOptions) -> Result<SpeedReport, ProbeError>;
}
