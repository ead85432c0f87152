//! Shared primitives for the JobPulse dashboard core.
//!
//! Everything here is plain data passed between the feed adapter and the
//! presentation shell: metric identifiers, the fiscal-year subscription
//! context, and per-view ids used in structured logs.

use std::borrow::Borrow;
use std::fmt;

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of one aggregate count displayed on a dashboard,
/// e.g. `todayJobCreateImport`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricKey(pub String);

impl MetricKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MetricKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MetricKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors produced while parsing a fiscal-year string.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FiscalYearError {
    #[error("fiscal year must look like \"25-26\", got {0:?}")]
    Malformed(String),
    #[error("fiscal year halves must be consecutive, got {0:?}")]
    NonConsecutive(String),
}

/// Reporting-year window scoping a dashboard subscription, e.g. `"25-26"`.
///
/// The window runs April through March, so the active year rolls over on
/// April 1st rather than January 1st.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FiscalYear(String);

impl FiscalYear {
    pub fn parse(raw: &str) -> Result<Self, FiscalYearError> {
        let (first, second) = raw
            .split_once('-')
            .ok_or_else(|| FiscalYearError::Malformed(raw.to_string()))?;
        if first.len() != 2 || second.len() != 2 {
            return Err(FiscalYearError::Malformed(raw.to_string()));
        }
        let start: u32 = first
            .parse()
            .map_err(|_| FiscalYearError::Malformed(raw.to_string()))?;
        let end: u32 = second
            .parse()
            .map_err(|_| FiscalYearError::Malformed(raw.to_string()))?;
        if (start + 1) % 100 != end {
            return Err(FiscalYearError::NonConsecutive(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Fiscal year containing today's date.
    pub fn current() -> Self {
        let today = Local::now().date_naive();
        let start = if today.month() >= 4 {
            today.year()
        } else {
            today.year() - 1
        };
        Self(format!("{:02}-{:02}", start % 100, (start + 1) % 100))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for one mounted dashboard view.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub Uuid);

impl ViewId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
