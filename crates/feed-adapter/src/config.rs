//! Endpoint configuration for the dashboard feed.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment override for the feed endpoint, checked after the explicit
/// override and before the profile default.
pub const FEED_URL_ENV: &str = "JOBPULSE_FEED_URL";

/// Named deployment profiles the back office ships with.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DeployProfile {
    SecureProduction,
    Production,
    Testing,
    Local,
}

impl DeployProfile {
    /// Map a deployment profile name onto an endpoint set.
    ///
    /// An unrecognized name keeps the dashboard usable in an unconfigured
    /// environment: it falls back to the local endpoint and logs a
    /// diagnostic warning instead of failing.
    pub fn resolve(name: &str) -> Self {
        match name {
            "secure-production" => Self::SecureProduction,
            "production" => Self::Production,
            "testing" => Self::Testing,
            "local" => Self::Local,
            other => {
                warn!(
                    target: "feed-config",
                    profile = %other,
                    "unrecognized deployment profile; using local endpoint"
                );
                Self::Local
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecureProduction => "secure-production",
            Self::Production => "production",
            Self::Testing => "testing",
            Self::Local => "local",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::SecureProduction => "wss://live.jobpulse.app/feed",
            Self::Production => "ws://live.jobpulse.app/feed",
            Self::Testing => "ws://test.jobpulse.app/feed",
            Self::Local => "ws://127.0.0.1:9337/feed",
        }
    }
}

/// Configuration for one dashboard feed connection, resolved once at
/// view-mount time and immutable afterwards.
#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub profile: DeployProfile,
    pub endpoint_override: Option<String>,
    /// Capacity of the broadcast bus carrying feed events to renderers.
    pub event_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            profile: DeployProfile::Local,
            endpoint_override: None,
            event_capacity: 64,
        }
    }
}

impl FeedConfig {
    pub fn for_profile(name: &str) -> Self {
        Self {
            profile: DeployProfile::resolve(name),
            ..Self::default()
        }
    }

    /// Endpoint precedence: explicit override, then `JOBPULSE_FEED_URL`,
    /// then the profile's built-in endpoint.
    pub fn endpoint(&self) -> String {
        if let Some(endpoint) = &self.endpoint_override {
            return endpoint.clone();
        }
        if let Ok(value) = std::env::var(FEED_URL_ENV) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        self.profile.endpoint().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_recognized_profiles() {
        assert_eq!(
            DeployProfile::resolve("secure-production"),
            DeployProfile::SecureProduction
        );
        assert_eq!(DeployProfile::resolve("production"), DeployProfile::Production);
        assert_eq!(DeployProfile::resolve("testing"), DeployProfile::Testing);
        assert_eq!(DeployProfile::resolve("local"), DeployProfile::Local);
    }

    #[test]
    fn unknown_profile_falls_back_to_local() {
        let profile = DeployProfile::resolve("staging-eu-west");
        assert_eq!(profile, DeployProfile::Local);
        assert_eq!(profile.endpoint(), "ws://127.0.0.1:9337/feed");
    }

    #[test]
    fn explicit_override_wins() {
        let config = FeedConfig {
            profile: DeployProfile::Production,
            endpoint_override: Some("ws://10.0.0.5:9337/feed".to_string()),
            ..FeedConfig::default()
        };
        assert_eq!(config.endpoint(), "ws://10.0.0.5:9337/feed");
    }

    #[test]
    fn secure_profile_uses_tls_endpoint() {
        let config = FeedConfig {
            profile: DeployProfile::SecureProduction,
            ..FeedConfig::default()
        };
        // Guard against the env override leaking in from the test host.
        if std::env::var(FEED_URL_ENV).is_err() {
            assert_eq!(config.endpoint(), "wss://live.jobpulse.app/feed");
        }
    }
}
