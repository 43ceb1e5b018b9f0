use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::configuration::AuthSettings;
use crate::error::{AppError, ValidationError};
use crate::logger::RequestLogger;
use crate::middleware::JwtMiddleware;
use crate::routes::{current_user, health_check, login, refresh, register, revoke, webhook};
use crate::store::Store;

pub fn run(
    listener: TcpListener,
    store: Arc<dyn Store>,
    auth_settings: AuthSettings,
) -> Result<Server, std::io::Error> {
    let auth_service = web::Data::new(AuthService::new(store, auth_settings));

    let server = HttpServer::new(move || {
        // Undecodable JSON bodies are a 400 with the usual error envelope
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AppError::Validation(ValidationError::MalformedInput(err.to_string())).into()
        });

        App::new()
            // Global middleware
            .wrap(RequestLogger)

            // Shared state
            .app_data(auth_service.clone())
            .app_data(json_config)

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh))
            .route("/revoke", web::post().to(revoke))
            .route("/users", web::post().to(register))
            .route("/webhooks", web::post().to(webhook))

            // Requires a valid access token
            .service(
                web::resource("/users/me")
                    .wrap(JwtMiddleware::new(auth_service.clone()))
                    .route(web::get().to(current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
