//! Latest-counts store for one dashboard view.

use std::collections::HashMap;

use serde::Serialize;

use jobpulse_core_types::MetricKey;

/// Holds the latest known aggregate counts plus the current error and
/// loading condition. Owned by exactly one [`crate::FeedManager`]; never
/// shared across views.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SnapshotStore {
    values: HashMap<MetricKey, i64>,
    error: Option<String>,
    has_loaded_once: bool,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the snapshot sent right after subscription.
    pub fn apply_init(&mut self, metrics: HashMap<MetricKey, i64>) {
        self.merge(metrics);
    }

    /// Apply a refresh frame.
    pub fn apply_update(&mut self, metrics: HashMap<MetricKey, i64>) {
        self.merge(metrics);
    }

    // Provided keys overwrite key-for-key; keys absent from the incoming
    // mapping retain their stored value. Any successful apply clears the
    // error condition and ends the loading phase.
    fn merge(&mut self, metrics: HashMap<MetricKey, i64>) {
        self.values.extend(metrics);
        self.error = None;
        self.has_loaded_once = true;
    }

    /// Record an error condition; counts already held are untouched.
    pub fn apply_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Stored value, or `0` for keys never populated. The store itself
    /// never materializes zero entries.
    pub fn read(&self, key: &str) -> i64 {
        self.values.get(key).copied().unwrap_or(0)
    }

    /// True until the first successful apply.
    pub fn is_loading(&self) -> bool {
        !self.has_loaded_once
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
