//! Process configuration.
//!
//! Everything comes from environment variables at startup; tests construct
//! the struct directly instead of mutating the environment.

use eventick_ledger::RetryPolicy;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,

    /// HS256 secret for issued and accepted tokens.
    pub jwt_secret: String,

    /// When true, back the ledger with Postgres (`DATABASE_URL` required);
    /// otherwise use the in-memory store.
    pub use_persistent_store: bool,

    pub database_url: Option<String>,

    /// Admin login credentials checked by `/api/auth/admin-login`.
    pub admin_email: String,
    pub admin_password: String,

    /// Retry budget for reservations that lose a conditional-write race.
    pub retry: RetryPolicy,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        let admin_email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
        let admin_password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!("ADMIN_PASSWORD not set; using insecure dev default");
            "admin123".to_string()
        });

        let use_persistent_store = std::env::var("USE_PERSISTENT_STORE")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let retry = std::env::var("RESERVE_RETRY_BUDGET")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .map(|max_attempts| RetryPolicy { max_attempts })
            .unwrap_or_default();

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jwt_secret,
            use_persistent_store,
            database_url: std::env::var("DATABASE_URL").ok(),
            admin_email,
            admin_password,
            retry,
        }
    }

    /// In-memory configuration for tests.
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            jwt_secret: jwt_secret.to_string(),
            use_persistent_store: false,
            database_url: None,
            admin_email: "admin@example.com".to_string(),
            admin_password: "admin123".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}
