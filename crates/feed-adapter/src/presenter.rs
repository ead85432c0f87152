//! Pure render decisions derived from connection and store state.

use jobpulse_core_types::MetricKey;

use crate::manager::ConnectionState;
use crate::store::SnapshotStore;

/// Which of the three view bodies a screen renders.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RenderMode {
    Loading,
    Error,
    Data,
}

/// Outcome of the fixed presenter mapping for one state change.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderDecision {
    pub mode: RenderMode,
    pub status: &'static str,
    pub error: Option<String>,
}

/// Human-readable connection status line, shown in every mode.
pub fn status_text(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Connecting => "Connecting...",
        ConnectionState::Connected => "Connected",
        ConnectionState::Errored => "Connection error",
        ConnectionState::Disconnected => "Disconnected",
    }
}

/// The fixed mapping: loading until the first successful apply; before
/// that a recorded error yields the error view; after any successful load
/// the view stays on data. Later errors stay available on the event bus
/// for banner handling at the caller's discretion.
pub fn decide(state: ConnectionState, store: &SnapshotStore) -> RenderDecision {
    let mode = if !store.is_loading() {
        RenderMode::Data
    } else if store.error().is_some() {
        RenderMode::Error
    } else {
        RenderMode::Loading
    };
    RenderDecision {
        mode,
        status: status_text(state),
        error: match mode {
            RenderMode::Error => store.error().map(str::to_string),
            _ => None,
        },
    }
}

/// One displayed metric: which key to read and what to call it.
#[derive(Clone, Debug)]
pub struct MetricColumn {
    pub key: MetricKey,
    pub title: String,
}

impl MetricColumn {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: MetricKey::new(key),
            title: title.into(),
        }
    }
}

/// Static per-screen configuration: ordered columns, immutable for the
/// lifetime of a view. Owned by the presentation layer.
#[derive(Clone, Debug)]
pub struct DashboardViewConfig {
    pub name: String,
    pub columns: Vec<MetricColumn>,
}

impl DashboardViewConfig {
    pub fn new(name: impl Into<String>, columns: Vec<MetricColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

/// One resolved display row.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricRow {
    pub key: MetricKey,
    pub title: String,
    pub value: i64,
}

/// Resolve the configured columns against the store; keys the feed has
/// never sent render as `0`.
pub fn rows(config: &DashboardViewConfig, store: &SnapshotStore) -> Vec<MetricRow> {
    config
        .columns
        .iter()
        .map(|column| MetricRow {
            key: column.key.clone(),
            title: column.title.clone(),
            value: store.read(column.key.as_str()),
        })
        .collect()
}
