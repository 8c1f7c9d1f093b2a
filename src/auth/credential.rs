//! Signed authorization credentials
//!
//! Wire form: `cred-<b64url(claims JSON)>.<b64url(signature)>`
//!
//! The claims JSON is the canonical encoding: fixed field order, scope
//! patterns sorted by the `BTreeMap` backing `PermissionSet`. Re-serializing
//! parsed claims reproduces the exact signed bytes, so the verifier can
//! recompute the signature from the stated fields alone.
//!
//! `parse` checks format, version, and algorithm only. Signature
//! verification is the verifier's first authorization step; an incompatible
//! signing scheme is rejected here rather than mis-verified there.

use crate::auth::permissions::PermissionSet;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Prefix for encoded credentials
pub const CREDENTIAL_PREFIX: &str = "cred-";

/// Current credential format version
pub const CREDENTIAL_VERSION: u8 = 1;

/// Signature algorithm identifier (HMAC-SHA256)
pub const SIGNATURE_ALGORITHM: &str = "HS256";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid credential format")]
    InvalidFormat,

    #[error("invalid credential prefix: expected '{expected}', got '{got}'")]
    InvalidPrefix { expected: String, got: String },

    #[error("credential decode error: {0}")]
    DecodeError(String),

    #[error("unsupported credential version: {0}")]
    UnsupportedVersion(u8),

    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// The signed fields of a credential
///
/// Field order is the canonical encoding; do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Format version
    #[serde(rename = "v")]
    pub version: u8,
    /// Signature algorithm identifier
    #[serde(rename = "alg")]
    pub algorithm: String,
    /// Application identity the signing key belongs to
    pub app: String,
    /// Opaque client token the credential was issued to
    #[serde(rename = "sub")]
    pub client_token: String,
    /// Random credential id, for audit correlation
    #[serde(rename = "cid")]
    pub credential_id: String,
    /// Issue time (unix seconds)
    #[serde(rename = "iat")]
    pub issued_at: u64,
    /// Expiry time (unix seconds); issued_at + ttl
    #[serde(rename = "exp")]
    pub expires_at: u64,
    /// Channel permissions granted to the client token
    pub scope: PermissionSet,
}

impl CredentialClaims {
    /// The canonical byte sequence the signature is computed over
    ///
    /// Deterministic for a given set of logical fields: struct fields
    /// serialize in declaration order and the scope map is sorted.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("serialize claims")
    }

    /// Generate a fresh random credential id
    pub fn fresh_id() -> String {
        let mut bytes = [0u8; 12];
        rand::rng().fill(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

/// A signed, immutable authorization credential
///
/// Freely clonable; holds no exclusive resource. Verification rejects it
/// after expiry or revocation but the value itself never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub claims: CredentialClaims,
    /// HMAC-SHA256 over `claims.canonical_bytes()`
    pub signature: Vec<u8>,
}

impl Credential {
    pub fn new(claims: CredentialClaims, signature: Vec<u8>) -> Self {
        Self { claims, signature }
    }

    /// Encode to the wire form handed to clients
    pub fn encode(&self) -> String {
        let payload_b64 = URL_SAFE_NO_PAD.encode(self.claims.canonical_bytes());
        let signature_b64 = URL_SAFE_NO_PAD.encode(&self.signature);
        format!("{}{}.{}", CREDENTIAL_PREFIX, payload_b64, signature_b64)
    }

    /// Parse a wire-form credential
    ///
    /// Checks structure, version, and algorithm. Does NOT verify the
    /// signature; that is the verifier's job.
    pub fn parse(token: &str) -> Result<Self, CredentialError> {
        if !token.starts_with(CREDENTIAL_PREFIX) {
            return Err(CredentialError::InvalidPrefix {
                expected: CREDENTIAL_PREFIX.to_string(),
                got: token.chars().take(5).collect(),
            });
        }

        let content = &token[CREDENTIAL_PREFIX.len()..];
        let (payload_b64, signature_b64) = content
            .split_once('.')
            .ok_or(CredentialError::InvalidFormat)?;
        if signature_b64.contains('.') {
            return Err(CredentialError::InvalidFormat);
        }

        let payload_json = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| CredentialError::DecodeError(e.to_string()))?;

        let claims: CredentialClaims = serde_json::from_slice(&payload_json)
            .map_err(|e| CredentialError::DecodeError(e.to_string()))?;

        if claims.version != CREDENTIAL_VERSION {
            return Err(CredentialError::UnsupportedVersion(claims.version));
        }

        if claims.algorithm != SIGNATURE_ALGORITHM {
            return Err(CredentialError::UnsupportedAlgorithm(claims.algorithm));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| CredentialError::DecodeError(e.to_string()))?;

        Ok(Self { claims, signature })
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::Permission;
    use crate::channels::ChannelPattern;

    fn sample_claims() -> CredentialClaims {
        let mut scope = PermissionSet::new();
        scope.grant(ChannelPattern::parse("room:*").unwrap(), Permission::Read);

        CredentialClaims {
            version: CREDENTIAL_VERSION,
            algorithm: SIGNATURE_ALGORITHM.to_string(),
            app: "demo-app".to_string(),
            client_token: "client-1".to_string(),
            credential_id: CredentialClaims::fresh_id(),
            issued_at: 1_700_000_000,
            expires_at: 1_700_000_060,
            scope,
        }
    }

    #[test]
    fn test_encode_parse_round_trip() {
        let cred = Credential::new(sample_claims(), vec![1, 2, 3, 4]);
        let encoded = cred.encode();
        assert!(encoded.starts_with(CREDENTIAL_PREFIX));

        let parsed = Credential::parse(&encoded).unwrap();
        assert_eq!(parsed, cred);
    }

    #[test]
    fn test_canonical_bytes_reproducible() {
        let claims = sample_claims();
        let cred = Credential::new(claims.clone(), vec![0; 32]);

        let parsed = Credential::parse(&cred.encode()).unwrap();
        assert_eq!(parsed.claims.canonical_bytes(), claims.canonical_bytes());
    }

    #[test]
    fn test_parse_rejects_bad_prefix() {
        let result = Credential::parse("role-abc.def");
        assert!(matches!(result, Err(CredentialError::InvalidPrefix { .. })));
    }

    #[test]
    fn test_parse_rejects_missing_signature() {
        let cred = Credential::new(sample_claims(), vec![1, 2, 3]);
        let encoded = cred.encode();
        let payload_only = encoded.split('.').next().unwrap();

        let result = Credential::parse(payload_only);
        assert!(matches!(result, Err(CredentialError::InvalidFormat)));
    }

    #[test]
    fn test_parse_rejects_unknown_version() {
        let mut claims = sample_claims();
        claims.version = 99;
        let encoded = Credential::new(claims, vec![1, 2, 3]).encode();

        let result = Credential::parse(&encoded);
        assert!(matches!(result, Err(CredentialError::UnsupportedVersion(99))));
    }

    #[test]
    fn test_parse_rejects_unknown_algorithm() {
        let mut claims = sample_claims();
        claims.algorithm = "ES256".to_string();
        let encoded = Credential::new(claims, vec![1, 2, 3]).encode();

        let result = Credential::parse(&encoded);
        assert!(matches!(
            result,
            Err(CredentialError::UnsupportedAlgorithm(alg)) if alg == "ES256"
        ));
    }

    #[test]
    fn test_parse_rejects_garbage_payload() {
        let token = format!("{}not-base64!!.sig", CREDENTIAL_PREFIX);
        assert!(matches!(
            Credential::parse(&token),
            Err(CredentialError::DecodeError(_))
        ));
    }
}
