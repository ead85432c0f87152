//! JobPulse live-feed adapter.
//!
//! One [`FeedManager`] per mounted dashboard view: it owns a push-channel
//! connection for the view's lifetime, subscribes by fiscal year, decodes
//! inbound frames into a snapshot store, and publishes every state change
//! on a broadcast bus so the renderer can re-derive its view.

pub mod config;
pub mod decoder;
pub mod manager;
pub mod metrics;
pub mod presenter;
pub mod store;
pub mod transport;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use jobpulse_core_types::FiscalYear;

pub use manager::{ConnectionState, FeedEvent, FeedManager};

/// Errors emitted by the feed surface.
#[derive(Clone, Debug, Error)]
pub enum FeedError {
    #[error("transport not started")]
    NotStarted,
    #[error("transport channel closed")]
    ChannelClosed,
    #[error("internal error: {0}")]
    Internal(String),
}

/// Subscription request sent once, immediately after the channel opens.
///
/// Wire shape: `{"year":"25-26"}`. No further outbound messages are part
/// of the feed contract.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub year: FiscalYear,
}

impl Subscription {
    pub fn for_year(year: FiscalYear) -> Self {
        Self { year }
    }
}
