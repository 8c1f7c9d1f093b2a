//! Authorization subsystem configuration
//!
//! Everything is passed into constructors; there are no process-wide
//! mutable singletons.

use crate::auth::Permission;
use std::fmt;
use std::str::FromStr;

/// What to do when the revocation store cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailMode {
    /// Deny: "cannot confirm non-revocation" is treated as revoked
    Closed,
    /// Allow: log the outage and skip the revocation check
    Open,
}

impl FromStr for FailMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "closed" => Ok(FailMode::Closed),
            "open" => Ok(FailMode::Open),
            _ => Err(format!("invalid fail mode: {} (expected closed|open)", s)),
        }
    }
}

impl fmt::Display for FailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailMode::Closed => write!(f, "closed"),
            FailMode::Open => write!(f, "open"),
        }
    }
}

/// Issuance and verification policy
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Upper bound on issuance TTL, in seconds
    pub max_ttl_seconds: u64,
    /// Permission returned when no pattern matches a channel
    pub default_permission: Permission,
    /// Behavior when the revocation store is unavailable
    pub revocation_fail_mode: FailMode,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_ttl_seconds: 86_400,
            default_permission: Permission::None,
            revocation_fail_mode: FailMode::Closed,
        }
    }
}

impl AuthConfig {
    /// Load overrides from the environment, falling back to defaults
    ///
    /// Recognized: TURNSTILE_MAX_TTL, TURNSTILE_DEFAULT_PERMISSION,
    /// TURNSTILE_REVOCATION_FAIL_MODE
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_ttl_seconds: std::env::var("TURNSTILE_MAX_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_ttl_seconds),
            default_permission: std::env::var("TURNSTILE_DEFAULT_PERMISSION")
                .ok()
                .and_then(|v| Permission::parse(&v))
                .unwrap_or(defaults.default_permission),
            revocation_fail_mode: std::env::var("TURNSTILE_REVOCATION_FAIL_MODE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.revocation_fail_mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_mode_parse() {
        assert_eq!("closed".parse::<FailMode>().unwrap(), FailMode::Closed);
        assert_eq!("OPEN".parse::<FailMode>().unwrap(), FailMode::Open);
        assert!("maybe".parse::<FailMode>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.max_ttl_seconds, 86_400);
        assert_eq!(config.default_permission, Permission::None);
        assert_eq!(config.revocation_fail_mode, FailMode::Closed);
    }
}
