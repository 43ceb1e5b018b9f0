/// Refresh Token Management
///
/// Handles refresh token generation, storage, validation, and revocation.
/// Refresh tokens are:
/// - 256 bits from the OS-seeded thread RNG, hex-encoded
/// - Keyed in the store by their SHA-256 digest (plaintext is never stored)
/// - Valid for a fixed 60 days; the expiry is never extended
/// - Revocable, permanently; they are not rotated on refresh

use chrono::{DateTime, Duration, Utc};
use rand::{thread_rng, RngCore};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AppError, DatabaseError};
use crate::store::{RefreshTokenRecord, Store, User};

/// Fixed lifetime of a refresh token
pub const REFRESH_TOKEN_TTL: Duration = Duration::days(60);

const TOKEN_BYTES: usize = 32;

/// Lifecycle state of a refresh token.
///
/// `Expired` and `Revoked` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    Expired,
    Revoked,
}

/// A refresh token as seen by the caller that presented it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    fn from_record(token: &str, record: RefreshTokenRecord) -> Self {
        Self {
            token: token.to_string(),
            user_id: record.user_id,
            created_at: record.created_at,
            expires_at: record.expires_at,
            revoked_at: record.revoked_at,
        }
    }

    /// Revocation wins over expiry; `expires_at` itself is already expired.
    pub fn state_at(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked_at.is_some() {
            RefreshTokenState::Revoked
        } else if now >= self.expires_at {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.state_at(now) == RefreshTokenState::Active
    }
}

/// Generate a new opaque refresh token string (64 hex chars)
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Storage key for a refresh token
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn token_not_found() -> AppError {
    AppError::Database(DatabaseError::NotFound("refresh token".to_string()))
}

/// Create and persist a refresh token for `user_id`
///
/// # Errors
/// Returns error if the store write fails
pub async fn issue_refresh_token(store: &dyn Store, user_id: Uuid) -> Result<RefreshToken, AppError> {
    let token = generate_refresh_token();
    let now = Utc::now();
    let record = RefreshTokenRecord {
        token_hash: hash_token(&token),
        user_id,
        created_at: now,
        expires_at: now + REFRESH_TOKEN_TTL,
        revoked_at: None,
    };

    store.create_refresh_token(&record).await?;
    tracing::debug!(user_id = %user_id, expires_at = %record.expires_at, "Refresh token issued");

    Ok(RefreshToken::from_record(&token, record))
}

/// Fetch a refresh token by its plaintext value
///
/// # Errors
/// `NotFound` if no row matches
pub async fn lookup_refresh_token(store: &dyn Store, token: &str) -> Result<RefreshToken, AppError> {
    store
        .get_refresh_token(&hash_token(token))
        .await?
        .map(|record| RefreshToken::from_record(token, record))
        .ok_or_else(token_not_found)
}

/// Owner of a currently active refresh token
///
/// Revoked and expired tokens never resolve, even if the caller skipped its
/// own state check.
///
/// # Errors
/// `NotFound` if the token is missing, revoked, or expired
pub async fn resolve_owner(store: &dyn Store, token: &str) -> Result<User, AppError> {
    store
        .get_user_by_refresh_token(&hash_token(token), Utc::now())
        .await?
        .ok_or_else(token_not_found)
}

/// Revoke a refresh token. Revoking twice is not an error.
///
/// # Errors
/// `NotFound` if no row matches, storage error on write failure
pub async fn revoke_refresh_token(store: &dyn Store, token: &str) -> Result<(), AppError> {
    if store.revoke_refresh_token(&hash_token(token), Utc::now()).await? {
        Ok(())
    } else {
        Err(token_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token();

        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_refresh_token());
    }

    #[test]
    fn test_token_hashing() {
        let token = generate_refresh_token();
        let hash1 = hash_token(&token);
        let hash2 = hash_token(&token);

        assert_eq!(hash1, hash2);
        assert_ne!(token, hash1);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_state_transitions() {
        let now = Utc::now();
        let mut token = RefreshToken {
            token: "t".to_string(),
            user_id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + Duration::days(1),
            revoked_at: None,
        };

        assert_eq!(token.state_at(now), RefreshTokenState::Active);
        assert_eq!(token.state_at(token.expires_at), RefreshTokenState::Expired);
        assert_eq!(
            token.state_at(token.expires_at + Duration::seconds(1)),
            RefreshTokenState::Expired
        );

        token.revoked_at = Some(now);
        assert_eq!(token.state_at(now), RefreshTokenState::Revoked);
        assert_eq!(token.state_at(token.expires_at), RefreshTokenState::Revoked);
        assert!(!token.is_active_at(now));
    }

    #[tokio::test]
    async fn test_issue_persists_sixty_day_token() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();

        let issued = issue_refresh_token(&store, user.id).await.unwrap();
        assert_eq!(issued.expires_at - issued.created_at, Duration::days(60));
        assert!(issued.revoked_at.is_none());

        let stored = store.get_refresh_token(&hash_token(&issued.token)).await.unwrap();
        assert!(stored.is_some(), "token should be stored under its digest");
        assert!(store.get_refresh_token(&issued.token).await.unwrap().is_none());

        let found = lookup_refresh_token(&store, &issued.token).await.unwrap();
        assert_eq!(found, issued);
    }

    #[tokio::test]
    async fn test_lookup_unknown_token() {
        let store = MemoryStore::new();

        let result = lookup_refresh_token(&store, "nope").await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent_and_blocks_owner_resolution() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();
        let issued = issue_refresh_token(&store, user.id).await.unwrap();

        assert_eq!(resolve_owner(&store, &issued.token).await.unwrap().id, user.id);

        revoke_refresh_token(&store, &issued.token).await.unwrap();
        revoke_refresh_token(&store, &issued.token).await.unwrap();

        let found = lookup_refresh_token(&store, &issued.token).await.unwrap();
        assert_eq!(found.state_at(Utc::now()), RefreshTokenState::Revoked);
        assert!(resolve_owner(&store, &issued.token).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let store = MemoryStore::new();

        let result = revoke_refresh_token(&store, "nope").await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_expired_token_does_not_resolve() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();
        let issued = issue_refresh_token(&store, user.id).await.unwrap();

        store
            .set_refresh_token_expiry(&hash_token(&issued.token), Utc::now() - Duration::seconds(1))
            .unwrap();

        assert!(resolve_owner(&store, &issued.token).await.unwrap_err().is_not_found());
    }
}
