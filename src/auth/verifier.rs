//! Authorization verification
//!
//! Checks run in a fixed order, short-circuiting on the first failure:
//! signature, expiry, revocation, scope. A `Deny` is ordinary data the
//! broker handles per action - never an error, never a disconnect.
//!
//! Everything here is a pure computation over the credential except the
//! revocation lookup, which reads shared state through the injected store.

use crate::auth::credential::Credential;
use crate::auth::issuer::{unix_now, SigningKey};
use crate::auth::permissions::Operation;
use crate::channels::Channel;
use crate::config::{AuthConfig, FailMode};
use crate::storage::RevocationStore;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a credential was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Signature mismatch, or no key is known for the application
    BadSignature,
    /// Current time is past the credential's expiry
    Expired,
    /// A revocation record covers the credential's issue time
    Revoked,
    /// The resolved permission does not cover the requested operation
    InsufficientScope,
    /// Revocation status could not be confirmed (fail-closed deployments)
    RevocationUnavailable,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::BadSignature => write!(f, "bad signature"),
            DenyReason::Expired => write!(f, "expired"),
            DenyReason::Revoked => write!(f, "revoked"),
            DenyReason::InsufficientScope => write!(f, "insufficient scope"),
            DenyReason::RevocationUnavailable => write!(f, "revocation status unavailable"),
        }
    }
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => write!(f, "allow"),
            Decision::Deny(reason) => write!(f, "deny: {}", reason),
        }
    }
}

/// Known signing keys by application identity
#[derive(Debug, Default)]
pub struct KeyRing {
    keys: HashMap<String, SigningKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
        }
    }

    /// Register the signing key for an application
    pub fn insert(&mut self, app: impl Into<String>, key: SigningKey) {
        self.keys.insert(app.into(), key);
    }

    pub fn get(&self, app: &str) -> Option<&SigningKey> {
        self.keys.get(app)
    }

    /// Convenience: a ring holding a single application's key
    pub fn single(app: impl Into<String>, key: SigningKey) -> Self {
        let mut ring = Self::new();
        ring.insert(app, key);
        ring
    }
}

/// Verifies credentials on behalf of a connection broker
pub struct Verifier {
    keys: KeyRing,
    store: Arc<dyn RevocationStore>,
    config: AuthConfig,
}

impl Verifier {
    pub fn new(keys: KeyRing, store: Arc<dyn RevocationStore>, config: AuthConfig) -> Self {
        Self { keys, store, config }
    }

    /// Authorize `operation` on `channel` for the presented credential
    ///
    /// Called by the broker once at subscribe time and again at every
    /// publish; a credential that permits one need not permit the other.
    pub async fn authorize(
        &self,
        credential: &Credential,
        channel: &Channel,
        operation: Operation,
    ) -> Decision {
        self.authorize_at(credential, channel, operation, unix_now())
            .await
    }

    /// Authorize with the clock pinned to `now` (unix seconds)
    pub async fn authorize_at(
        &self,
        credential: &Credential,
        channel: &Channel,
        operation: Operation,
        now: u64,
    ) -> Decision {
        let claims = &credential.claims;

        // 1. Signature against the known key for the application
        let Some(key) = self.keys.get(&claims.app) else {
            debug!(app = %claims.app, "No signing key known for application");
            return Decision::Deny(DenyReason::BadSignature);
        };

        if !key.verify(&claims.canonical_bytes(), &credential.signature) {
            debug!(
                app = %claims.app,
                credential_id = %claims.credential_id,
                "Signature mismatch"
            );
            return Decision::Deny(DenyReason::BadSignature);
        }

        // 2. Expiry
        if now > claims.expires_at {
            return Decision::Deny(DenyReason::Expired);
        }

        // 3. Revocation: a record at or after the issue time kills the
        //    credential even though it has not expired
        match self.store.get(&claims.client_token).await {
            Ok(Some(revoked_before)) if revoked_before >= claims.issued_at => {
                debug!(
                    client = %claims.client_token,
                    revoked_before,
                    issued_at = claims.issued_at,
                    "Credential revoked"
                );
                return Decision::Deny(DenyReason::Revoked);
            }
            Ok(_) => {}
            Err(e) => match self.config.revocation_fail_mode {
                FailMode::Closed => {
                    warn!(error = %e, "Revocation store unavailable, failing closed");
                    return Decision::Deny(DenyReason::RevocationUnavailable);
                }
                FailMode::Open => {
                    warn!(error = %e, "Revocation store unavailable, failing open");
                }
            },
        }

        // 4. Scope
        let permission = claims
            .scope
            .resolve_or(channel, self.config.default_permission);
        if !permission.allows(operation) {
            return Decision::Deny(DenyReason::InsufficientScope);
        }

        Decision::Allow
    }
}
