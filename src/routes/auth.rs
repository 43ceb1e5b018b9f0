/// Session Routes
///
/// Login, access token refresh, and refresh token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::AuthService;
use crate::error::AppError;
use crate::store::User;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Requested access token lifetime, capped at one hour
    pub expires_in_seconds: Option<i64>,
}

/// Login response: the account plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

/// Freshly minted access token
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /login
///
/// # Errors
/// - 400: Malformed JSON body
/// - 401: Unknown email or wrong password (same message for both)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let outcome = service
        .login(&form.email, &form.password, form.expires_in_seconds)
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: outcome.user,
        token: outcome.access_token,
        refresh_token: outcome.refresh_token.token,
    }))
}

/// POST /refresh
///
/// Requires `Authorization: Bearer <refresh token>`.
///
/// # Errors
/// - 401: Missing, unknown, expired or revoked refresh token
/// - 500: Internal server error
pub async fn refresh(
    req: HttpRequest,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let token = service.refresh(req.headers()).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

/// POST /revoke
///
/// Requires `Authorization: Bearer <refresh token>`. Responds 204.
pub async fn revoke(
    req: HttpRequest,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    service.revoke(req.headers()).await?;
    Ok(HttpResponse::NoContent().finish())
}
