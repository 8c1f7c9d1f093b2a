//! CLI command definitions

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "turnstile")]
#[command(about = "Channel authorization and token issuance", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Application identity credentials are issued and verified for
    #[arg(long, env = "TURNSTILE_APP", global = true)]
    pub app: Option<String>,

    /// Signing secret for the application
    #[arg(long, env = "TURNSTILE_SECRET", global = true)]
    pub secret: Option<String>,

    /// Database URL for the revocation store
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Issue a signed credential
    ///
    /// Examples:
    ///   turnstile issue -g read=room:lobby --ttl 60
    ///   turnstile issue -g readwrite='room:*' -g read='feed:*' --client client-42
    Issue {
        /// Grant in the form permission=pattern (can be repeated)
        #[arg(short, long = "grant", value_parser = parse_grant_spec, required = true)]
        grant: Vec<String>,

        /// Client token the credential is issued to (defaults to a new UUID)
        #[arg(long)]
        client: Option<String>,

        /// Time-to-live in seconds
        #[arg(long, default_value_t = 3600)]
        ttl: u64,
    },

    /// Decode a credential and print its claims (no verification)
    Inspect {
        /// Encoded credential
        token: String,
    },

    /// Run the full authorization check for a channel/operation pair
    Verify {
        /// Encoded credential
        token: String,

        /// Concrete channel name, e.g. room:lobby
        #[arg(long)]
        channel: String,

        /// Operation: subscribe or publish
        #[arg(long, value_parser = parse_operation)]
        op: String,

        /// Evaluate at this unix timestamp instead of now
        #[arg(long)]
        at: Option<u64>,
    },

    /// Revoke all credentials for a client token issued up to now
    Revoke {
        /// Client token to revoke
        client: String,

        /// Revoked-before timestamp (defaults to now)
        #[arg(long)]
        at: Option<u64>,
    },

    /// Clear the revocation record for a client token
    Restore {
        /// Client token to restore
        client: String,
    },

    /// Age out revocation records that can no longer affect live credentials
    Prune {
        /// Remove records with revoked-before older than this timestamp
        /// (defaults to now minus the configured maximum TTL)
        #[arg(long)]
        before: Option<u64>,
    },

    /// Initialize the database schema
    Init,

    /// Show store status
    Status,
}

fn parse_grant_spec(s: &str) -> Result<String, String> {
    let (perm, pattern) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid grant '{}': expected permission=pattern", s))?;

    match perm.to_lowercase().as_str() {
        "none" | "read" | "write" | "readwrite" | "all" => {}
        _ => {
            return Err(format!(
                "Invalid permission '{}': must be none, read, write, or readwrite",
                perm
            ))
        }
    }

    if pattern.is_empty() {
        return Err("Pattern cannot be empty".to_string());
    }

    Ok(s.to_string())
}

fn parse_operation(s: &str) -> Result<String, String> {
    match s.to_lowercase().as_str() {
        "subscribe" | "publish" => Ok(s.to_lowercase()),
        _ => Err(format!(
            "Invalid operation: {}. Must be subscribe or publish",
            s
        )),
    }
}
