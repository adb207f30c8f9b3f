use crate::api::{
    self,
    email::LogEmailSender,
    handlers::{
        admin::{AdminConfig, AdminCredentials, AdminState},
        newsletter::{
            MemorySubscriberStore, NewsletterConfig, NewsletterState, PgSubscriberStore,
            SubscriberStore,
        },
    },
};
use crate::cli::commands::admin::Options as AdminOptions;
use anyhow::{Context, Result};
use rand::{RngCore, rngs::OsRng};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub site_base_url: String,
    pub admin: AdminOptions,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let store = subscriber_store(args.dsn.as_deref()).await?;

    let session_secret = match args.admin.session_secret {
        Some(secret) => secret,
        None => {
            warn!("No session secret configured; generated a random one, admin sessions end on restart");
            generate_session_secret()?
        }
    };

    let credentials = AdminCredentials::new(args.admin.email, args.admin.password);
    if !credentials.is_configured() {
        warn!("Admin email or password not configured; every admin login will be rejected");
    }

    let admin_config = AdminConfig::new(args.site_base_url.clone())
        .with_session_ttl_seconds(args.admin.session_ttl_seconds)
        .with_max_attempts(args.admin.max_attempts)
        .with_lockout_seconds(args.admin.lockout_seconds)
        .with_trust_proxy_headers(args.admin.trust_proxy_headers);
    let admin_state = Arc::new(AdminState::new(
        admin_config,
        Arc::new(credentials),
        session_secret,
    ));

    let newsletter_state = Arc::new(NewsletterState::new(
        NewsletterConfig::new(args.site_base_url),
        store,
        Arc::new(LogEmailSender),
    ));

    api::new(args.port, admin_state, newsletter_state).await
}

async fn subscriber_store(dsn: Option<&str>) -> Result<Arc<dyn SubscriberStore>> {
    let Some(dsn) = dsn else {
        warn!("No DSN configured; subscribers are kept in memory and lost on restart");
        return Ok(Arc::new(MemorySubscriberStore::new()));
    };

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(dsn)
        .await
        .context("Failed to connect to database")?;

    info!("Connected to subscriber database");

    Ok(Arc::new(PgSubscriberStore::new(pool)))
}

/// 32 random bytes, hex encoded.
fn generate_session_secret() -> Result<SecretString> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate session secret")?;
    Ok(SecretString::from(hex::encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn generated_secrets_are_random_hex() -> Result<()> {
        let first = generate_session_secret()?;
        let second = generate_session_secret()?;
        assert_eq!(first.expose_secret().len(), 64);
        assert!(first.expose_secret().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first.expose_secret(), second.expose_secret());
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_without_dsn() -> Result<()> {
        let store = subscriber_store(None).await?;
        store.ping().await?;
        assert!(store.list(10).await?.is_empty());
        Ok(())
    }
}
