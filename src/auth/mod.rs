/// Authentication module
///
/// Password hashing, credential header parsing, access token (JWT) issue and
/// verification, refresh token lifecycle, and the flows built on top of them.

mod claims;
mod extractor;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use claims::{Claims, ISSUER};
pub use extractor::{extract_api_key, extract_bearer};
pub use jwt::{
    issue_access_token, issue_access_token_at, verify_access_token, verify_access_token_at,
    ACCESS_TOKEN_TTL,
};
pub use password::{hash_password, verify_password};
pub use refresh_token::{
    generate_refresh_token, hash_token, issue_refresh_token, lookup_refresh_token, resolve_owner,
    revoke_refresh_token, RefreshToken, RefreshTokenState, REFRESH_TOKEN_TTL,
};
pub use service::{
    effective_access_ttl, AuthService, LoginOutcome, WebhookData, WebhookEvent, WebhookOutcome,
    UPGRADE_EVENT,
};
