//! Storage seam for user accounts.
//!
//! The login endpoint verifies a known user's password or auto-registers an
//! unknown email; both paths go through this trait. Implementations live in
//! `eventick-infra` next to the ticket store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use eventick_core::UserId;

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    /// Hex SHA-256 digest, see [`crate::password`].
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("user directory unavailable: {0}")]
    Unavailable(String),

    /// Unique-email constraint violated (e.g. two auto-registrations racing).
    #[error("email already registered: {0}")]
    DuplicateEmail(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;

    async fn insert_user(&self, user: &UserRecord) -> Result<(), DirectoryError>;
}

#[async_trait]
impl<D> UserDirectory for std::sync::Arc<D>
where
    D: UserDirectory + ?Sized,
{
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError> {
        (**self).find_by_email(email).await
    }

    async fn insert_user(&self, user: &UserRecord) -> Result<(), DirectoryError> {
        (**self).insert_user(user).await
    }
}
