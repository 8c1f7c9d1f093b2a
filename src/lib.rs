//! Turnstile - channel authorization and token issuance for pub/sub brokers
//!
//! Decides, for an opaque client token, which channels it may subscribe to
//! or publish on and for how long, and produces a signed, self-contained
//! credential that brokers verify without contacting the issuer again.

pub mod auth;
pub mod channels;
pub mod config;
pub mod storage;

pub use auth::{
    Credential, Decision, DenyReason, IssueError, Issuer, KeyRing, Operation, Permission,
    PermissionSet, SigningKey, Verifier,
};
pub use channels::{Channel, ChannelPattern};
pub use config::{AuthConfig, FailMode};
