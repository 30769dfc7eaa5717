use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::errors::ProbeError;
use crate::model::{MutationEvent, NavigationTiming};

/// Source of structural-change notifications for a watched subtree (the
/// whole document or one element). Subscription mechanics live entirely on
/// the feed side; the probe only consumes the resulting event stream.
#[async_trait]
pub trait MutationFeed: Send + Sync {
    /// Open the event stream. An `Err` means the host lacks the required
    /// notification primitive; the session then runs disabled.
    async fn subscribe(&self) -> Result<mpsc::Receiver<MutationEvent>, ProbeError>;
}

/// Read-only access to the host's navigation milestones. A failing
/// provider degrades to the empty structure, never to a session failure.
#[async_trait]
pub trait TimingProvider: Send + Sync {
    async fn navigation_timing(&self) -> Result<NavigationTiming, ProbeError>;
}

/// Provider for hosts without a timing facility.
pub struct NullTimingProvider;

#[async_trait]
impl TimingProvider for NullTimingProvider {
    async fn navigation_timing(&self) -> Result<NavigationTiming, ProbeError> {
        Ok(NavigationTiming::default())
    }
}

/// Channel-backed feed: the caller pushes `MutationEvent`s through the
/// returned sender. Single subscription per feed.
pub struct ChannelFeed {
    receiver: Mutex<Option<mpsc::Receiver<MutationEvent>>>,
}

/// Build a channel feed with the given buffer capacity.
pub fn channel_feed(capacity: usize) -> (ChannelFeed, mpsc::Sender<MutationEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        ChannelFeed {
            receiver: Mutex::new(Some(rx)),
        },
        tx,
    )
}

#[async_trait]
impl MutationFeed for ChannelFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<MutationEvent>, ProbeError> {
        self.receiver
            .lock()
            .take()
            .ok_or_else(|| ProbeError::internal("channel feed already subscribed"))
    }
}

/// Feed standing in for a host without structural-change notifications.
pub struct UnsupportedFeed;

#[async_trait]
impl MutationFeed for UnsupportedFeed {
    async fn subscribe(&self) -> Result<mpsc::Receiver<MutationEvent>, ProbeError> {
        Err(ProbeError::unsupported(
            "structural-change notifications unavailable",
        ))
    }
}
