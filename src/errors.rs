//! Errors surfaced by the CLI shell.

use thiserror::Error;

use jobpulse_core_types::FiscalYearError;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("screen {screen} is not available for role {role}")]
    ScreenNotPermitted { screen: String, role: String },
    #[error(transparent)]
    FiscalYear(#[from] FiscalYearError),
}
