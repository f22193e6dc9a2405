use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;

use eventick_auth::{Claims, Hs256JwtValidator, Role, TokenError, UserDirectory, hash_password};
use eventick_core::UserId;
use eventick_infra::{
    InMemoryTicketStore, InMemoryUserDirectory, PostgresTicketStore, PostgresUserDirectory,
};
use eventick_ledger::{Ledger, TicketStore};

use crate::config::ApiConfig;

/// Lifetime of issued tokens.
const TOKEN_TTL_HOURS: i64 = 24;

/// Everything the handlers need, wired once at startup and shared behind an
/// `Arc` extension.
pub struct AppServices {
    pub ledger: Ledger<Arc<dyn TicketStore>>,
    pub users: Arc<dyn UserDirectory>,
    pub jwt: Arc<Hs256JwtValidator>,
    pub admin_email: String,
    /// Digest of the configured admin password; the plaintext is dropped
    /// after wiring.
    pub admin_password_digest: String,
}

impl AppServices {
    /// Sign a fresh token for a principal that just authenticated.
    pub fn issue_token(
        &self,
        user_id: UserId,
        email: &str,
        role: Role,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(user_id, email, role, Utc::now(), Duration::hours(TOKEN_TTL_HOURS));
        self.jwt.mint(&claims)
    }
}

/// Wire the store, user directory, ledger and token validator from config.
///
/// The store handle is opened here, once, and injected everywhere; nothing
/// downstream opens connections lazily.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let (store, users): (Arc<dyn TicketStore>, Arc<dyn UserDirectory>) =
        if config.use_persistent_store {
            let url = config.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("USE_PERSISTENT_STORE=true requires DATABASE_URL")
            })?;
            let pool = PgPool::connect(url).await?;

            let store = PostgresTicketStore::new(pool.clone());
            store.ensure_schema().await?;
            let users = PostgresUserDirectory::new(pool);
            users.ensure_schema().await?;

            tracing::info!("using postgres-backed stores");
            (Arc::new(store), Arc::new(users))
        } else {
            tracing::info!("using in-memory stores");
            (
                Arc::new(InMemoryTicketStore::new()),
                Arc::new(InMemoryUserDirectory::new()),
            )
        };

    Ok(AppServices {
        ledger: Ledger::with_retry_policy(store, config.retry),
        users,
        jwt: Arc::new(Hs256JwtValidator::new(
            config.jwt_secret.clone().into_bytes(),
        )),
        admin_email: config.admin_email.clone(),
        admin_password_digest: hash_password(&config.admin_password),
    })
}
