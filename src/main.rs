//! Turnstile CLI entry point

mod cli;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use turnstile::auth::{Credential, Issuer, KeyRing, Operation, Permission, SigningKey, Verifier};
use turnstile::channels::{Channel, ChannelPattern};
use turnstile::config::AuthConfig;
use turnstile::storage::{
    MemoryRevocationStore, PostgresConfig, PostgresStore, RevocationStore,
};
use turnstile::PermissionSet;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AuthConfig::from_env();

    // Helper to get database config lazily (only when needed)
    let get_db_config = || -> Result<PostgresConfig> {
        if let Some(url) = &cli.database_url {
            PostgresConfig::from_url(url).context("Invalid DATABASE_URL")
        } else {
            PostgresConfig::from_env().context("DATABASE_URL not set")
        }
    };

    let get_app = || -> Result<String> {
        cli.app
            .clone()
            .context("TURNSTILE_APP or --app required")
    };

    let get_key = || -> Result<SigningKey> {
        let secret = cli
            .secret
            .clone()
            .context("TURNSTILE_SECRET or --secret required")?;
        SigningKey::new(secret.into_bytes()).context("Invalid signing secret")
    };

    match cli.command {
        Commands::Issue { grant, client, ttl } => {
            issue(&config, get_app()?, get_key()?, grant, client, ttl)
        }
        Commands::Verify {
            token,
            channel,
            op,
            at,
        } => {
            let store = open_store(cli.database_url.as_deref(), get_db_config).await?;
            verify(&config, get_app()?, get_key()?, store, token, channel, op, at).await
        }
        Commands::Inspect { token } => inspect(token),
        Commands::Revoke { client, at } => {
            let store = PostgresStore::new(get_db_config()?).await?;
            revoke(store, client, at).await
        }
        Commands::Restore { client } => {
            let store = PostgresStore::new(get_db_config()?).await?;
            restore(store, client).await
        }
        Commands::Prune { before } => {
            let store = PostgresStore::new(get_db_config()?).await?;
            prune(&config, store, before).await
        }
        Commands::Init => init(get_db_config()?).await,
        Commands::Status => status(get_db_config()?).await,
    }
}

/// Open the shared revocation store, or an empty in-memory one when no
/// database is configured (verification then sees no revocations).
async fn open_store<F>(
    database_url: Option<&str>,
    get_db_config: F,
) -> Result<Arc<dyn RevocationStore>>
where
    F: FnOnce() -> Result<PostgresConfig>,
{
    if database_url.is_some() || std::env::var("DATABASE_URL").is_ok() {
        let store = PostgresStore::new(get_db_config()?).await?;
        Ok(Arc::new(store))
    } else {
        warn!("No DATABASE_URL set; verifying without shared revocation records");
        Ok(Arc::new(MemoryRevocationStore::new()))
    }
}

fn parse_grants(specs: &[String]) -> Result<PermissionSet> {
    let mut permissions = PermissionSet::new();

    for spec in specs {
        let (perm_str, pattern_str) = spec
            .split_once('=')
            .with_context(|| format!("Invalid grant: {}", spec))?;

        let permission = Permission::parse(perm_str)
            .with_context(|| format!("Invalid permission: {}", perm_str))?;
        let pattern = ChannelPattern::parse(pattern_str)
            .with_context(|| format!("Invalid pattern: {}", pattern_str))?;

        permissions.grant(pattern, permission);
    }

    Ok(permissions)
}

fn issue(
    config: &AuthConfig,
    app: String,
    key: SigningKey,
    grant_specs: Vec<String>,
    client: Option<String>,
    ttl: u64,
) -> Result<()> {
    let permissions = parse_grants(&grant_specs)?;
    let client = client.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let issuer = Issuer::new(app, key, config);
    let credential = issuer.issue(&client, ttl, permissions)?;

    println!("{}", credential.encode());
    println!();
    println!("Client:  {}", client);
    println!("Expires: {}", credential.claims.expires_at);
    println!("Scope:");
    for (pattern, permission) in credential.claims.scope.iter() {
        println!("  {} = {}", pattern, permission);
    }

    Ok(())
}

fn inspect(token: String) -> Result<()> {
    let credential = Credential::parse(&token).context("Invalid credential")?;
    let claims = &credential.claims;

    println!("Version:   {}", claims.version);
    println!("Algorithm: {}", claims.algorithm);
    println!("App:       {}", claims.app);
    println!("Client:    {}", claims.client_token);
    println!("Id:        {}", claims.credential_id);
    println!("Issued:    {}", claims.issued_at);
    println!("Expires:   {}", claims.expires_at);
    println!("Scope:");
    if claims.scope.is_empty() {
        println!("  (none)");
    } else {
        for (pattern, permission) in claims.scope.iter() {
            println!("  {} = {}", pattern, permission);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn verify(
    config: &AuthConfig,
    app: String,
    key: SigningKey,
    store: Arc<dyn RevocationStore>,
    token: String,
    channel: String,
    op: String,
    at: Option<u64>,
) -> Result<()> {
    let credential = Credential::parse(&token).context("Invalid credential")?;
    let channel = Channel::parse(&channel).context("Invalid channel")?;
    let operation = match op.as_str() {
        "subscribe" => Operation::Subscribe,
        "publish" => Operation::Publish,
        other => anyhow::bail!("Invalid operation: {}", other),
    };

    let verifier = Verifier::new(KeyRing::single(app, key), store, config.clone());

    let decision = match at {
        Some(now) => verifier.authorize_at(&credential, &channel, operation, now).await,
        None => verifier.authorize(&credential, &channel, operation).await,
    };

    println!("{}", decision);

    if !decision.is_allowed() {
        std::process::exit(1);
    }

    Ok(())
}

async fn revoke(store: PostgresStore, client: String, at: Option<u64>) -> Result<()> {
    let revoked_before = at.unwrap_or_else(unix_now);
    store.set(&client, revoked_before).await?;

    info!(client = %client, revoked_before, "Revocation recorded");
    println!("Revoked {} (issued at or before {})", client, revoked_before);

    Ok(())
}

async fn restore(store: PostgresStore, client: String) -> Result<()> {
    store.clear(&client).await?;
    println!("Cleared revocation record for {}", client);
    Ok(())
}

async fn prune(config: &AuthConfig, store: PostgresStore, before: Option<u64>) -> Result<()> {
    // Records older than the longest possible credential TTL cannot affect
    // any live credential
    let before = before.unwrap_or_else(|| unix_now().saturating_sub(config.max_ttl_seconds));
    let removed = store.prune(before).await?;

    println!("Removed {} revocation record(s) older than {}", removed, before);
    Ok(())
}

async fn init(db_config: PostgresConfig) -> Result<()> {
    let _store = PostgresStore::new(db_config).await?;
    println!("Database schema initialized successfully");
    Ok(())
}

async fn status(db_config: PostgresConfig) -> Result<()> {
    let store = PostgresStore::new(db_config).await?;
    let records = store.record_count().await?;

    println!("Turnstile Status");
    println!("================");
    println!("Database:           Connected");
    println!("Revocation records: {}", records);

    Ok(())
}

/// Current unix time in seconds
fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}
