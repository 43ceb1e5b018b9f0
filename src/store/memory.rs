use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{RefreshTokenRecord, Store, User};
use crate::error::{AppError, DatabaseError};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

/// In-process store with the same semantics as `PgStore`.
///
/// Used by the test suites and for running the service without a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Database(DatabaseError::Storage("store lock poisoned".to_string())))
    }

    /// Overwrite a refresh token's expiry. Test hook for simulating elapsed time.
    pub fn set_refresh_token_expiry(
        &self,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        Ok(match tables.refresh_tokens.get_mut(token_hash) {
            Some(record) => {
                record.expires_at = expires_at;
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == email) {
            return Err(AppError::Database(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_upgraded: false,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.lock()?;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn get_user_by_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, AppError> {
        let tables = self.lock()?;
        let owner = tables
            .refresh_tokens
            .get(token_hash)
            .filter(|rt| rt.revoked_at.is_none() && rt.expires_at > now)
            .and_then(|rt| tables.users.get(&rt.user_id))
            .cloned();
        Ok(owner)
    }

    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        if tables.refresh_tokens.contains_key(&record.token_hash) {
            return Err(AppError::Database(DatabaseError::Storage(
                "unique constraint refresh_tokens_pkey violated".to_string(),
            )));
        }
        tables
            .refresh_tokens
            .insert(record.token_hash.clone(), record.clone());
        Ok(())
    }

    async fn get_refresh_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        let tables = self.lock()?;
        Ok(tables.refresh_tokens.get(token_hash).cloned())
    }

    async fn revoke_refresh_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        Ok(match tables.refresh_tokens.get_mut(token_hash) {
            Some(record) => {
                record.revoked_at.get_or_insert(now);
                true
            }
            None => false,
        })
    }

    async fn upgrade_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let mut tables = self.lock()?;
        Ok(tables.users.get_mut(&user_id).map(|user| {
            user.is_upgraded = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(token_hash: &str, user_id: Uuid, expires_in: Duration) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            token_hash: token_hash.to_string(),
            user_id,
            created_at: now,
            expires_at: now + expires_in,
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.create_user("a@b.com", "hash").await.expect("first insert");

        let result = store.create_user("a@b.com", "hash").await;
        assert!(matches!(
            result,
            Err(AppError::Database(DatabaseError::UniqueConstraintViolation(_)))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_refresh_token_is_a_storage_error() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();
        let token = record("tok", user.id, Duration::days(1));
        store.create_refresh_token(&token).await.unwrap();

        let result = store.create_refresh_token(&token).await;
        assert!(matches!(
            result,
            Err(AppError::Database(DatabaseError::Storage(_)))
        ));
    }

    #[tokio::test]
    async fn test_owner_lookup_skips_revoked_and_expired_rows() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();
        let now = Utc::now();

        store
            .create_refresh_token(&record("live", user.id, Duration::days(1)))
            .await
            .unwrap();
        store
            .create_refresh_token(&record("lapsed", user.id, Duration::seconds(-1)))
            .await
            .unwrap();
        store
            .create_refresh_token(&record("dead", user.id, Duration::days(1)))
            .await
            .unwrap();
        store.revoke_refresh_token("dead", now).await.unwrap();

        assert_eq!(
            store.get_user_by_refresh_token("live", now).await.unwrap(),
            Some(user)
        );
        assert!(store.get_user_by_refresh_token("lapsed", now).await.unwrap().is_none());
        assert!(store.get_user_by_refresh_token("dead", now).await.unwrap().is_none());
        assert!(store.get_user_by_refresh_token("missing", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_keeps_first_timestamp() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();
        store
            .create_refresh_token(&record("tok", user.id, Duration::days(1)))
            .await
            .unwrap();

        let first = Utc::now();
        assert!(store.revoke_refresh_token("tok", first).await.unwrap());
        assert!(store
            .revoke_refresh_token("tok", first + Duration::seconds(30))
            .await
            .unwrap());

        let stored = store.get_refresh_token("tok").await.unwrap().unwrap();
        assert_eq!(stored.revoked_at, Some(first));
        assert!(!store.revoke_refresh_token("missing", first).await.unwrap());
    }

    #[tokio::test]
    async fn test_upgrade_user() {
        let store = MemoryStore::new();
        let user = store.create_user("a@b.com", "hash").await.unwrap();

        let upgraded = store.upgrade_user(user.id).await.unwrap().unwrap();
        assert!(upgraded.is_upgraded);
        assert!(store.upgrade_user(Uuid::new_v4()).await.unwrap().is_none());
    }
}
