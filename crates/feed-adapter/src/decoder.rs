//! Classification of inbound push-channel frames.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use jobpulse_core_types::MetricKey;

/// Message used when a server `error` frame carries no text.
pub const DEFAULT_SERVER_ERROR: &str = "Server error";

/// Frame variants accepted from the push channel.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundFrame {
    /// Snapshot sent right after subscription.
    Init(HashMap<MetricKey, i64>),
    /// Refresh carrying the complete current counts for the keys it names.
    Update(HashMap<MetricKey, i64>),
    /// Server-reported problem; metric state is untouched.
    ServerError(String),
}

/// Rejection reasons for frames that never reach the store.
///
/// Frames with an unknown `type` discriminator are rejected rather than
/// silently dropped, so protocol drift surfaces as a visible error
/// condition instead of a stale dashboard.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("error parsing server data")]
    Malformed,
    #[error("unrecognized message type")]
    Unrecognized { kind: Option<String> },
}

#[derive(Debug, Deserialize)]
struct WireFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    data: Option<HashMap<MetricKey, i64>>,
    #[serde(default)]
    error: Option<String>,
}

/// Turn a raw text payload into an [`InboundFrame`] or reject it whole;
/// nothing partial is ever applied.
pub fn decode_frame(raw: &str) -> Result<InboundFrame, DecodeError> {
    let frame: WireFrame = serde_json::from_str(raw).map_err(|_| DecodeError::Malformed)?;
    match frame.kind.as_deref() {
        Some("init") => Ok(InboundFrame::Init(frame.data.unwrap_or_default())),
        Some("update") => Ok(InboundFrame::Update(frame.data.unwrap_or_default())),
        Some("error") => Ok(InboundFrame::ServerError(
            frame.error.unwrap_or_else(|| DEFAULT_SERVER_ERROR.to_string()),
        )),
        other => Err(DecodeError::Unrecognized {
            kind: other.map(str::to_string),
        }),
    }
}
