//! Boundary contracts consumed by the shell: who is signed in, and which
//! reporting year to subscribe to. The feed core never sees either.

use std::env;
use std::fmt;

use jobpulse_core_types::FiscalYear;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Admin,
    Operations,
    Accounts,
    Compliance,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "operations" | "ops" => Some(Self::Operations),
            "accounts" => Some(Self::Accounts),
            "compliance" => Some(Self::Compliance),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operations => "operations",
            Self::Accounts => "accounts",
            Self::Compliance => "compliance",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct UserIdentity {
    pub username: String,
    pub role: Role,
}

/// Session/identity collaborator. `None` means no session is active
/// (local development runs unauthenticated).
pub trait IdentityProvider {
    fn current_user(&self) -> Option<UserIdentity>;
}

/// Reads `JOBPULSE_USER` / `JOBPULSE_ROLE`, the contract the back-office
/// session service fulfils when the CLI runs inside it.
#[derive(Default)]
pub struct EnvIdentityProvider;

impl IdentityProvider for EnvIdentityProvider {
    fn current_user(&self) -> Option<UserIdentity> {
        let username = env::var("JOBPULSE_USER").ok()?.trim().to_string();
        if username.is_empty() {
            return None;
        }
        let role = env::var("JOBPULSE_ROLE")
            .ok()
            .and_then(|raw| Role::parse(raw.trim()))
            .unwrap_or(Role::Operations);
        Some(UserIdentity { username, role })
    }
}

/// Fiscal-year collaborator supplying the subscription context.
pub trait FiscalYearProvider {
    fn fiscal_year(&self) -> FiscalYear;
}

/// Wall-clock derivation of the April-March reporting year.
#[derive(Default)]
pub struct SystemFiscalYearProvider;

impl FiscalYearProvider for SystemFiscalYearProvider {
    fn fiscal_year(&self) -> FiscalYear {
        FiscalYear::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_accepts_known_names() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("OPS"), Some(Role::Operations));
        assert_eq!(Role::parse("accounts"), Some(Role::Accounts));
        assert_eq!(Role::parse("gatekeeper"), None);
    }

    #[test]
    fn system_provider_yields_a_valid_year() {
        let year = SystemFiscalYearProvider.fiscal_year();
        assert!(FiscalYear::parse(year.as_str()).is_ok());
    }
}
