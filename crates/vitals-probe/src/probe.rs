use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use vitals_core_types::{Clock, MonotonicClock};

use crate::api::RenderVitals;
use crate::errors::ProbeError;
use crate::model::{DocumentReport, NavigationTiming, SpeedReport};
use crate::policy::{MeasureOptions, DEFAULT_DOCUMENT_DURATION_MS, DEFAULT_NODE_DURATION_MS};
use crate::ports::{MutationFeed, TimingProvider};
use crate::session::{drive, RenderSession};

/// Probe wired to a mutation feed and a timing provider. One instance per
/// watched root; the feed decides whether that root is the whole document
/// or a single element.
pub struct RenderProbeImpl<F, T>
where
    F: MutationFeed,
    T: TimingProvider,
{
    feed: Arc<F>,
    timing: Arc<T>,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
}

impl<F, T> RenderProbeImpl<F, T>
where
    F: MutationFeed,
    T: TimingProvider,
{
    /// The default clock starts counting at construction, so build the
    /// probe at the instant the measurement should be anchored to.
    pub fn new(feed: Arc<F>, timing: Arc<T>) -> Self {
        Self {
            feed,
            timing,
            clock: Arc::new(MonotonicClock::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Override the elapsed-time source, e.g. a host clock anchored at
    /// navigation start, or a manual clock in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Stop all in-flight sessions early; they finalize with the elapsed
    /// time reached so far.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    async fn fetch_timing(&self) -> NavigationTiming {
        match self.timing.navigation_timing().await {
            Ok(timing) => timing,
            Err(err) => {
                warn!(target: "vitals.session", %err, "timing provider unavailable, using empty timing");
                NavigationTiming::default()
            }
        }
    }
}

#[async_trait]
impl<F, T> RenderVitals for RenderProbeImpl<F, T>
where
    F: MutationFeed,
    T: TimingProvider,
{
    async fn measure_document(&self, options: MeasureOptions) -> DocumentReport {
        let (enabled, feed_rx) = match self.feed.subscribe().await {
            Ok(rx) => (true, Some(rx)),
            Err(err) => {
                warn!(target: "vitals.session", %err, "mutation feed unsupported, session disabled");
                (false, None)
            }
        };
        let duration = options.duration_or(DEFAULT_DOCUMENT_DURATION_MS);
        let mut session = RenderSession::from_navigation_start(
            Arc::clone(&self.clock),
            &options,
            duration,
            enabled,
        );
        let speed = drive(&mut session, feed_rx, &self.shutdown).await;
        let timing = if enabled {
            self.fetch_timing().await
        } else {
            NavigationTiming::default()
        };
        DocumentReport { speed, timing }
    }

    async fn measure_node(&self, options: MeasureOptions) -> Result<SpeedReport, ProbeError> {
        let feed_rx = self.feed.subscribe().await?;
        let duration = options.duration_or(DEFAULT_NODE_DURATION_MS);
        let mut session =
            RenderSession::new(Arc::clone(&self.clock), &options, duration, true);
        let speed = drive(&mut session, Some(feed_rx), &self.shutdown).await;
        if session.fcp_time().is_none() && session.fmp_time().is_none() {
            return Err(ProbeError::NoContentObserved);
        }
        Ok(speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core_types::{ManualClock, NodeId};

    use crate::model::{MutationEvent, NodeSnapshot};
    use crate::ports::{channel_feed, NullTimingProvider, UnsupportedFeed};

    struct FailingTimingProvider;

    #[async_trait]
    impl TimingProvider for FailingTimingProvider {
        async fn navigation_timing(&self) -> Result<NavigationTiming, ProbeError> {
            Err(ProbeError::internal("timing facility missing"))
        }
    }

    struct FixedTimingProvider(NavigationTiming);

    #[async_trait]
    impl TimingProvider for FixedTimingProvider {
        async fn navigation_timing(&self) -> Result<NavigationTiming, ProbeError> {
            Ok(self.0)
        }
    }

    fn text_batch(t: &str) -> MutationEvent {
        MutationEvent::added(vec![NodeSnapshot::text(NodeId(1), t)])
    }

    fn short(duration: u64) -> MeasureOptions {
        MeasureOptions {
            duration_ms: Some(duration),
            ..MeasureOptions::default()
        }
    }

    #[tokio::test]
    async fn document_report_merges_navigation_timing() {
        let (feed, tx) = channel_feed(8);
        let timing = NavigationTiming {
            ttfb: 123,
            first_paint: 88,
            ..NavigationTiming::default()
        };
        let clock = ManualClock::new();
        let probe = RenderProbeImpl::new(Arc::new(feed), Arc::new(FixedTimingProvider(timing)))
            .with_clock(Arc::new(clock.clone()));

        clock.set(7);
        tx.send(text_batch("hello")).await.unwrap();
        drop(tx);

        let report = probe.measure_document(short(60)).await;
        assert_eq!(report.speed.fcp, 7);
        assert_eq!(report.speed.fmp, 7);
        assert_eq!(report.timing.ttfb, 123);
        assert_eq!(report.timing.first_paint, 88);
    }

    #[tokio::test]
    async fn unsupported_host_degrades_to_elapsed_time() {
        let clock = ManualClock::new();
        let probe = RenderProbeImpl::new(Arc::new(UnsupportedFeed), Arc::new(NullTimingProvider))
            .with_clock(Arc::new(clock.clone()));

        clock.set(42);
        let report = probe.measure_document(short(30)).await;
        assert_eq!(report.speed.fcp, report.speed.tti);
        assert_eq!(report.speed.fmp, report.speed.tti);
        assert_eq!(report.timing, NavigationTiming::default());
    }

    #[tokio::test]
    async fn timing_provider_failure_is_not_a_session_failure() {
        let (feed, tx) = channel_feed(8);
        let clock = ManualClock::new();
        let probe = RenderProbeImpl::new(Arc::new(feed), Arc::new(FailingTimingProvider))
            .with_clock(Arc::new(clock.clone()));

        clock.set(3);
        tx.send(text_batch("content")).await.unwrap();
        drop(tx);

        let report = probe.measure_document(short(40)).await;
        assert_eq!(report.speed.fcp, 3);
        assert_eq!(report.timing, NavigationTiming::default());
    }

    #[tokio::test]
    async fn silent_subtree_rejects_with_no_content() {
        let (feed, _tx) = channel_feed(8);
        let probe = RenderProbeImpl::new(Arc::new(feed), Arc::new(NullTimingProvider))
            .with_clock(Arc::new(ManualClock::new()));

        let err = probe.measure_node(short(40)).await.unwrap_err();
        assert!(matches!(err, ProbeError::NoContentObserved));
    }

    #[tokio::test]
    async fn scoped_node_times_are_relative_to_call_time() {
        let (feed, tx) = channel_feed(8);
        let clock = ManualClock::new();
        clock.set(1_000);
        let probe = Arc::new(
            RenderProbeImpl::new(Arc::new(feed), Arc::new(NullTimingProvider))
                .with_clock(Arc::new(clock.clone())),
        );

        let task = tokio::spawn({
            let probe = Arc::clone(&probe);
            async move { probe.measure_node(short(60)).await }
        });
        // Let the session anchor its origin before time moves on.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        clock.set(1_015);
        tx.send(text_batch("widget")).await.unwrap();
        drop(tx);

        let report = task.await.unwrap().unwrap();
        assert_eq!(report.fcp, 15);
        assert_eq!(report.fmp, 15);
    }

    #[tokio::test]
    async fn unsupported_feed_fails_scoped_measurement() {
        let probe = RenderProbeImpl::new(Arc::new(UnsupportedFeed), Arc::new(NullTimingProvider));
        let err = probe.measure_node(short(40)).await.unwrap_err();
        assert!(matches!(err, ProbeError::Unsupported(_)));
    }

    #[tokio::test]
    async fn shutdown_finalizes_in_flight_sessions() {
        let (feed, _tx) = channel_feed(8);
        let probe = RenderProbeImpl::new(Arc::new(feed), Arc::new(NullTimingProvider))
            .with_clock(Arc::new(ManualClock::new()));
        probe.shutdown();

        // A 60-second budget returns immediately once cancelled.
        let report = probe.measure_document(short(60_000)).await;
        assert_eq!(report.speed.fcp, report.speed.tti);
    }
}
