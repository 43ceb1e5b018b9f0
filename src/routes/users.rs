use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::AuthService;
use crate::error::AppError;
use crate::middleware::AuthenticatedUser;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// POST /users
///
/// # Errors
/// - 400: Invalid email or empty password
/// - 409: Email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user = service.register(&form.email, &form.password).await?;
    Ok(HttpResponse::Created().json(user))
}

/// GET /users/me
///
/// Behind `JwtMiddleware`; requires `Authorization: Bearer <access token>`.
pub async fn current_user(
    user: web::ReqData<AuthenticatedUser>,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let user = service.current_user(user.0).await?;
    Ok(HttpResponse::Ok().json(user))
}
