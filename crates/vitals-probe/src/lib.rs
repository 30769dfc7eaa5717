//! Render-quality probe: estimates first contentful paint, first
//! meaningful paint, and time-to-interactive for a loading document or a
//! single watched subtree, without a native meaningful-paint signal.
//!
//! The probe consumes batches of inserted-node snapshots from a
//! [`ports::MutationFeed`], scores their meaningfulness, tracks score
//! bursts in a time-pruned history to pick the FMP instant, and runs an
//! adaptive polling loop to detect sustained responsiveness for TTI.

pub mod api;
pub mod detector;
pub mod errors;
pub mod events;
pub mod history;
pub mod judges;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod ports;
pub mod probe;
pub mod scorer;
pub mod session;

pub use api::RenderVitals;
pub use errors::ProbeError;
pub use model::{
    DocumentReport, MutationEvent, NavigationTiming, NodeGeometry, NodeKind, NodeSnapshot,
    SpeedReport,
};
pub use policy::MeasureOptions;
pub use ports::{channel_feed, ChannelFeed, MutationFeed, NullTimingProvider, TimingProvider};
pub use probe::RenderProbeImpl;
pub use session::RenderSession;
