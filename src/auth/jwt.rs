/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed and carry no server-side state, so verifying
/// one never touches the store.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ISSUER};
use crate::error::{AppError, AuthError};

/// Default and maximum access token lifetime
pub const ACCESS_TOKEN_TTL: Duration = Duration::hours(1);

/// Generate a new access token for a user
///
/// # Errors
/// Returns a signing error if encoding fails
pub fn issue_access_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, AppError> {
    issue_access_token_at(user_id, secret, ttl, Utc::now())
}

/// Same as [`issue_access_token`] with an explicit issue time
pub fn issue_access_token_at(
    user_id: Uuid,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = Claims::new(user_id, ttl, now);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Signing(e.to_string()))
}

/// Validate an access token and return the user it was issued to
///
/// # Errors
/// - `TokenInvalid`: bad signature, malformed token, wrong issuer, bad subject
/// - `TokenExpired`: otherwise valid token whose `exp` has been reached
pub fn verify_access_token(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    verify_access_token_at(token, secret, Utc::now())
}

/// Same as [`verify_access_token`] evaluated at `now`
pub fn verify_access_token_at(
    token: &str,
    secret: &str,
    now: DateTime<Utc>,
) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    // Expiry is checked below without leeway
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidIssuer => tracing::warn!("Access token has unexpected issuer"),
                ErrorKind::InvalidSignature => tracing::warn!("Access token signature mismatch"),
                _ => tracing::debug!("Access token rejected: {}", e),
            }
            AuthError::TokenInvalid
        })?;

    if claims.is_expired_at(now) {
        return Err(AuthError::TokenExpired);
    }

    claims.user_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    #[test]
    fn test_issue_and_verify_token() {
        let user_id = Uuid::new_v4();

        let token = issue_access_token(user_id, SECRET, ACCESS_TOKEN_TTL).expect("Failed to issue token");
        let verified = verify_access_token(&token, SECRET).expect("Failed to verify token");

        assert_eq!(verified, user_id);
    }

    #[test]
    fn test_token_valid_until_ttl_elapses() {
        let user_id = Uuid::new_v4();
        let issued = Utc::now();
        let ttl = Duration::seconds(30);
        let token = issue_access_token_at(user_id, SECRET, ttl, issued).unwrap();

        assert_eq!(verify_access_token_at(&token, SECRET, issued), Ok(user_id));
        assert_eq!(
            verify_access_token_at(&token, SECRET, issued + Duration::seconds(29)),
            Ok(user_id)
        );
        assert_eq!(
            verify_access_token_at(&token, SECRET, issued + ttl),
            Err(AuthError::TokenExpired)
        );
        assert_eq!(
            verify_access_token_at(&token, SECRET, issued + Duration::hours(2)),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn test_zero_ttl_is_born_expired() {
        let token = issue_access_token(Uuid::new_v4(), SECRET, Duration::zero()).unwrap();

        assert_eq!(verify_access_token(&token, SECRET), Err(AuthError::TokenExpired));
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_access_token("invalid.token.here", SECRET);

        assert_eq!(result, Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_tampered_token() {
        let token = issue_access_token(Uuid::new_v4(), SECRET, ACCESS_TOKEN_TTL).unwrap();

        let tampered = format!("{}X", token);
        assert_eq!(verify_access_token(&tampered, SECRET), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_access_token(Uuid::new_v4(), SECRET, ACCESS_TOKEN_TTL).unwrap();

        let result = verify_access_token(&token, "another-secret-key-of-sufficient-size");
        assert_eq!(result, Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_wrong_issuer() {
        let mut claims = Claims::new(Uuid::new_v4(), ACCESS_TOKEN_TTL, Utc::now());
        claims.iss = "someone-else".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(verify_access_token(&token, SECRET), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_expired_token_with_bad_signature_is_invalid() {
        let issued = Utc::now() - Duration::hours(3);
        let token = issue_access_token_at(Uuid::new_v4(), SECRET, ACCESS_TOKEN_TTL, issued).unwrap();

        let result = verify_access_token(&token, "another-secret-key-of-sufficient-size");
        assert_eq!(result, Err(AuthError::TokenInvalid));
    }
}
