/// Persistence boundary
///
/// The authentication core only needs a handful of CRUD operations. They are
/// collected in the `Store` trait so the same flows run against PostgreSQL in
/// production and an in-memory map in tests.

mod memory;
mod models;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::AppError;

pub use memory::MemoryStore;
pub use models::{RefreshTokenRecord, User};
pub use postgres::PgStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new user. Fails with a unique-constraint error on duplicate email.
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    /// Owner of a refresh token that is neither revoked nor expired at `now`.
    async fn get_user_by_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError>;

    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;

    async fn get_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Stamp `revoked_at` unless already set. Returns false when no row matches.
    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Set the upgrade flag. Returns None when the user does not exist.
    async fn upgrade_user(&self, user_id: Uuid) -> Result<Option<User>, AppError>;
}
