//! Credential issuance
//!
//! The issuer owns the signing key for the lifetime of the process and
//! produces self-contained credentials: no storage or network access is
//! needed to issue, and the verifier can check them independently.

use crate::auth::credential::{
    Credential, CredentialClaims, CREDENTIAL_VERSION, SIGNATURE_ALGORITHM,
};
use crate::auth::permissions::PermissionSet;
use crate::config::AuthConfig;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::info;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Minimum signing key length, in bytes
const MIN_KEY_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("ttl out of range: {requested}s (must be 1..={max}s)")]
    TtlOutOfRange { requested: u64, max: u64 },

    #[error("client token cannot be empty")]
    EmptyClientToken,
}

/// HMAC signing key material
///
/// Debug output is redacted so keys never leak into logs.
#[derive(Clone)]
pub struct SigningKey {
    key: Vec<u8>,
}

impl SigningKey {
    /// Wrap key material, rejecting keys too short to be meaningful
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, IssueError> {
        let key = key.into();
        if key.is_empty() {
            return Err(IssueError::InvalidKey("key is empty".to_string()));
        }
        if key.len() < MIN_KEY_LEN {
            return Err(IssueError::InvalidKey(format!(
                "key is {} bytes, minimum is {}",
                key.len(),
                MIN_KEY_LEN
            )));
        }
        Ok(Self { key })
    }

    /// Sign a canonical byte sequence
    pub(crate) fn sign(&self, bytes: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(bytes);
        mac.finalize().into_bytes().to_vec()
    }

    /// Constant-time signature check
    pub(crate) fn verify(&self, bytes: &[u8], signature: &[u8]) -> bool {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(bytes);
        mac.verify_slice(signature).is_ok()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey([REDACTED])")
    }
}

/// Current unix time in seconds
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

/// Issues signed credentials for one application identity
pub struct Issuer {
    app: String,
    key: SigningKey,
    max_ttl_seconds: u64,
}

impl Issuer {
    pub fn new(app: impl Into<String>, key: SigningKey, config: &AuthConfig) -> Self {
        Self {
            app: app.into(),
            key,
            max_ttl_seconds: config.max_ttl_seconds,
        }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    /// Issue a credential valid from now for `ttl_seconds`
    ///
    /// An empty permission set is allowed: the credential authenticates the
    /// client but authorizes nothing.
    pub fn issue(
        &self,
        client_token: &str,
        ttl_seconds: u64,
        permissions: PermissionSet,
    ) -> Result<Credential, IssueError> {
        self.issue_at(client_token, ttl_seconds, permissions, unix_now())
    }

    /// Issue with the issue time pinned to `now` (unix seconds)
    pub fn issue_at(
        &self,
        client_token: &str,
        ttl_seconds: u64,
        permissions: PermissionSet,
        now: u64,
    ) -> Result<Credential, IssueError> {
        if client_token.is_empty() {
            return Err(IssueError::EmptyClientToken);
        }

        if ttl_seconds == 0 || ttl_seconds > self.max_ttl_seconds {
            return Err(IssueError::TtlOutOfRange {
                requested: ttl_seconds,
                max: self.max_ttl_seconds,
            });
        }

        let claims = CredentialClaims {
            version: CREDENTIAL_VERSION,
            algorithm: SIGNATURE_ALGORITHM.to_string(),
            app: self.app.clone(),
            client_token: client_token.to_string(),
            credential_id: CredentialClaims::fresh_id(),
            issued_at: now,
            expires_at: now + ttl_seconds,
            scope: permissions,
        };

        let signature = self.key.sign(&claims.canonical_bytes());

        info!(
            app = %self.app,
            client = %claims.client_token,
            credential_id = %claims.credential_id,
            expires_at = claims.expires_at,
            patterns = claims.scope.len(),
            "Issued credential"
        );

        Ok(Credential::new(claims, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::Permission;
    use crate::channels::ChannelPattern;

    const TEST_SECRET: &[u8] = b"test-secret-key-for-signing";

    fn issuer() -> Issuer {
        Issuer::new(
            "demo-app",
            SigningKey::new(TEST_SECRET).unwrap(),
            &AuthConfig::default(),
        )
    }

    #[test]
    fn test_issue_basic() {
        let mut scope = PermissionSet::new();
        scope.grant(ChannelPattern::parse("room:*").unwrap(), Permission::Read);

        let cred = issuer().issue_at("client-1", 60, scope, 1_000).unwrap();

        assert_eq!(cred.claims.app, "demo-app");
        assert_eq!(cred.claims.client_token, "client-1");
        assert_eq!(cred.claims.issued_at, 1_000);
        assert_eq!(cred.claims.expires_at, 1_060);
        assert!(!cred.signature.is_empty());
    }

    #[test]
    fn test_issue_empty_scope_allowed() {
        let cred = issuer()
            .issue_at("client-1", 60, PermissionSet::new(), 1_000)
            .unwrap();
        assert!(cred.claims.scope.is_empty());
    }

    #[test]
    fn test_issue_rejects_zero_ttl() {
        let result = issuer().issue_at("client-1", 0, PermissionSet::new(), 1_000);
        assert!(matches!(result, Err(IssueError::TtlOutOfRange { .. })));
    }

    #[test]
    fn test_issue_rejects_excessive_ttl() {
        let result = issuer().issue_at("client-1", 86_401, PermissionSet::new(), 1_000);
        assert!(matches!(
            result,
            Err(IssueError::TtlOutOfRange {
                requested: 86_401,
                max: 86_400
            })
        ));
    }

    #[test]
    fn test_issue_rejects_empty_client_token() {
        let result = issuer().issue_at("", 60, PermissionSet::new(), 1_000);
        assert!(matches!(result, Err(IssueError::EmptyClientToken)));
    }

    #[test]
    fn test_signing_key_rejects_weak_keys() {
        assert!(matches!(
            SigningKey::new(Vec::new()),
            Err(IssueError::InvalidKey(_))
        ));
        assert!(matches!(
            SigningKey::new(b"short".to_vec()),
            Err(IssueError::InvalidKey(_))
        ));
        assert!(SigningKey::new(TEST_SECRET).is_ok());
    }

    #[test]
    fn test_signing_key_debug_redacted() {
        let key = SigningKey::new(TEST_SECRET).unwrap();
        assert_eq!(format!("{:?}", key), "SigningKey([REDACTED])");
    }

    #[test]
    fn test_signature_binds_to_key() {
        let key_a = SigningKey::new(b"aaaaaaaaaaaaaaaaaaaa").unwrap();
        let key_b = SigningKey::new(b"bbbbbbbbbbbbbbbbbbbb").unwrap();

        let sig = key_a.sign(b"payload");
        assert!(key_a.verify(b"payload", &sig));
        assert!(!key_b.verify(b"payload", &sig));
        assert!(!key_a.verify(b"other", &sig));
    }
}
