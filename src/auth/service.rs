/// Authentication flows
///
/// `AuthService` ties the hasher, header extractor, access token codec and
/// refresh token store together into login, refresh and revoke, plus the
/// account and webhook operations that sit next to them.
///
/// Every refresh-token failure (absent, expired, revoked) surfaces as the same
/// `AuthError::Unauthorized`; the actual cause is only logged.

use std::sync::Arc;

use actix_web::http::header::HeaderMap;
use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::{extract_api_key, extract_bearer};
use crate::auth::jwt::{issue_access_token, verify_access_token, ACCESS_TOKEN_TTL};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::{
    issue_refresh_token, lookup_refresh_token, resolve_owner, revoke_refresh_token, RefreshToken,
    RefreshTokenState,
};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError, DatabaseError, ValidationError};
use crate::store::{Store, User};
use crate::validators::{is_valid_email, is_valid_password};

/// Webhook event that marks a user as upgraded
pub const UPGRADE_EVENT: &str = "user.upgraded";

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

/// Payload posted to the webhook endpoint.
///
/// Only `user.upgraded` needs `data.user_id`; other events may omit `data`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub data: Option<WebhookData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

impl WebhookEvent {
    pub fn upgrade(user_id: Uuid) -> Self {
        Self {
            event: UPGRADE_EVENT.to_string(),
            data: Some(WebhookData {
                user_id: Some(user_id),
            }),
        }
    }

    fn user_id(&self) -> Option<Uuid> {
        self.data.as_ref().and_then(|data| data.user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Upgraded(User),
    Ignored,
}

/// Access token lifetime for a login request.
///
/// Capped at [`ACCESS_TOKEN_TTL`]. Zero or negative requests are honoured and
/// produce a token that is already expired.
pub fn effective_access_ttl(requested_seconds: Option<i64>) -> Duration {
    match requested_seconds {
        Some(seconds) => {
            let capped = seconds.min(ACCESS_TOKEN_TTL.num_seconds());
            Duration::try_seconds(capped).unwrap_or_else(Duration::zero)
        }
        None => ACCESS_TOKEN_TTL,
    }
}

pub struct AuthService {
    store: Arc<dyn Store>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, settings: AuthSettings) -> Self {
        Self { store, settings }
    }

    /// Create an account
    ///
    /// # Errors
    /// - Validation error for a bad email or empty password
    /// - Unique-constraint error when the email is taken
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = is_valid_email(email)?;
        is_valid_password(password)?;

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        let user = self.store.create_user(&email, &password_hash).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Exchange email and password for an access token and a refresh token
    ///
    /// # Errors
    /// `InvalidCredentials` for an unknown email or a wrong password; the two
    /// cases are indistinguishable to the caller.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        expires_in_seconds: Option<i64>,
    ) -> Result<LoginOutcome, AppError> {
        let user = match self.store.get_user_by_email(email).await? {
            Some(user) => user,
            None => {
                tracing::warn!("Login attempt for unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        let candidate = password.to_string();
        let stored_hash = user.password_hash.clone();
        let password_ok =
            tokio::task::spawn_blocking(move || verify_password(&candidate, &stored_hash)).await?;
        if !password_ok {
            tracing::warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let ttl = effective_access_ttl(expires_in_seconds);
        let access_token = issue_access_token(user.id, &self.settings.jwt_secret, ttl)?;
        let refresh_token = issue_refresh_token(self.store.as_ref(), user.id).await?;

        tracing::info!(
            user_id = %user.id,
            access_ttl_seconds = ttl.num_seconds(),
            "User logged in"
        );

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Mint a fresh one-hour access token from a bearer refresh token.
    /// The refresh token itself is left untouched.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String, AppError> {
        let token = extract_bearer(headers).map_err(reject)?;

        let refresh_token = lookup_refresh_token(self.store.as_ref(), &token)
            .await
            .map_err(unauthorized_if_not_found)?;

        let state = refresh_token.state_at(Utc::now());
        if state != RefreshTokenState::Active {
            tracing::warn!(
                user_id = %refresh_token.user_id,
                state = ?state,
                "Refresh attempted with unusable token"
            );
            return Err(AuthError::Unauthorized.into());
        }

        // Fails if the token was revoked or lapsed since the lookup
        let user = resolve_owner(self.store.as_ref(), &token)
            .await
            .map_err(unauthorized_if_not_found)?;

        let access_token = issue_access_token(user.id, &self.settings.jwt_secret, ACCESS_TOKEN_TTL)?;
        tracing::info!(user_id = %user.id, "Access token refreshed");
        Ok(access_token)
    }

    /// Permanently revoke the bearer refresh token
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let token = extract_bearer(headers).map_err(reject)?;

        let refresh_token = lookup_refresh_token(self.store.as_ref(), &token)
            .await
            .map_err(unauthorized_if_not_found)?;

        revoke_refresh_token(self.store.as_ref(), &token)
            .await
            .map_err(unauthorized_if_not_found)?;

        tracing::info!(user_id = %refresh_token.user_id, "Refresh token revoked");
        Ok(())
    }

    /// Resolve the user behind a bearer access token
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = extract_bearer(headers)?;
        verify_access_token(&token, &self.settings.jwt_secret)
    }

    /// Load the account for an authenticated user id
    pub async fn current_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.store.get_user_by_id(user_id).await?.ok_or_else(|| {
            tracing::warn!(user_id = %user_id, "Valid access token for missing user");
            AppError::Auth(AuthError::Unauthorized)
        })
    }

    /// Check the webhook's `ApiKey` credential against the configured key
    pub fn authorize_webhook(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let key = extract_api_key(headers).map_err(reject)?;
        if key != self.settings.webhook_api_key {
            tracing::warn!("Webhook called with wrong API key");
            return Err(AuthError::Unauthorized.into());
        }
        Ok(())
    }

    /// Apply a webhook event. Unrecognised events are accepted and ignored.
    ///
    /// # Errors
    /// - Validation error when an upgrade event has no `data.user_id`
    /// - `NotFound` when an upgrade event names an unknown user
    pub async fn handle_webhook_event(&self, event: &WebhookEvent) -> Result<WebhookOutcome, AppError> {
        if event.event != UPGRADE_EVENT {
            tracing::info!(event = %event.event, "Ignoring webhook event");
            return Ok(WebhookOutcome::Ignored);
        }

        let user_id = event
            .user_id()
            .ok_or_else(|| ValidationError::EmptyField("data.user_id".to_string()))?;
        let user = self.store.upgrade_user(user_id).await?.ok_or_else(|| {
            AppError::Database(DatabaseError::NotFound(format!("user {}", user_id)))
        })?;

        tracing::info!(user_id = %user.id, "User upgraded");
        Ok(WebhookOutcome::Upgraded(user))
    }
}

fn reject(err: AuthError) -> AppError {
    tracing::warn!(error = %err, "Rejected credential header");
    AppError::Auth(AuthError::Unauthorized)
}

fn unauthorized_if_not_found(err: AppError) -> AppError {
    if err.is_not_found() {
        tracing::warn!("Unknown or inactive refresh token presented");
        AppError::Auth(AuthError::Unauthorized)
    } else {
        err
    }
}
