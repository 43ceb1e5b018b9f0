use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::{AuthService, WebhookEvent, WebhookOutcome};
use crate::error::{AppError, ValidationError};

/// POST /webhooks
///
/// The API key is checked before the body is decoded, so a bad key is a 401
/// even when the payload is garbage.
///
/// # Errors
/// - 401: Missing or wrong `ApiKey` credential
/// - 400: Body is not a valid event, or an upgrade event lacks `data.user_id`
/// - 404: Upgrade event for an unknown user
pub async fn webhook(
    req: HttpRequest,
    body: web::Bytes,
    service: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    service.authorize_webhook(req.headers())?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(ValidationError::MalformedInput(e.to_string())))?;

    match service.handle_webhook_event(&event).await? {
        WebhookOutcome::Upgraded(user) => {
            tracing::debug!(user_id = %user.id, event = %event.event, "Webhook applied");
        }
        WebhookOutcome::Ignored => {}
    }

    Ok(HttpResponse::NoContent().finish())
}
