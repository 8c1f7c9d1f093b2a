//! Authorization core: permissions, credentials, issuance, verification
//!
//! Credential lifecycle, observed through repeated authorize calls:
//! - Valid: between issue and the earlier of expiry/revocation
//! - Expired: current time passed `expires_at` (terminal)
//! - Revoked: administrative action (terminal)
//!
//! Check order at verification: signature, expiry, revocation, scope.

mod credential;
mod issuer;
mod permissions;
mod verifier;

pub use credential::{
    Credential, CredentialClaims, CredentialError, CREDENTIAL_PREFIX, CREDENTIAL_VERSION,
    SIGNATURE_ALGORITHM,
};
pub use issuer::{IssueError, Issuer, SigningKey};
pub use permissions::{Operation, Permission, PermissionSet};
pub use verifier::{Decision, DenyReason, KeyRing, Verifier};
