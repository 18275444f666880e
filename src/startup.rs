use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{error::JsonPayloadError, middleware::Logger, web, App, HttpRequest, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::configuration::AuthSettings;
use crate::error::{AppError, ValidationError};
use crate::metrics::Metrics;
use crate::middleware::{HitCounter, JwtMiddleware};
use crate::routes::{
    current_user, get_metrics, health_check, login, refresh, register, reset_metrics, revoke,
};
use crate::store::{SessionStore, UserRegistry};

/// Turn body decoding failures into our 400 response shape
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(ValidationError::MalformedBody(err.to_string())).into()
}

pub fn run<S>(
    listener: TcpListener,
    store: Arc<S>,
    auth_settings: AuthSettings,
    static_dir: String,
) -> Result<Server, std::io::Error>
where
    S: SessionStore + UserRegistry + 'static,
{
    let session_store: Arc<dyn SessionStore> = store.clone();
    let registry: Arc<dyn UserRegistry> = store;

    let jwt_secret = auth_settings.secret.clone();
    let jwt_issuer = auth_settings.issuer.clone();
    let auth_service = web::Data::new(AuthService::new(session_store, auth_settings));
    let registry = web::Data::from(registry);
    let metrics = web::Data::new(Metrics::new());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(auth_service.clone())
            .app_data(registry.clone())
            .app_data(metrics.clone())
            .route("/api/healthz", web::get().to(health_check))
            .route("/api/users", web::post().to(register))
            .service(
                web::resource("/api/users/me")
                    .wrap(JwtMiddleware::new(&jwt_secret, &jwt_issuer))
                    .route(web::get().to(current_user)),
            )
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .route("/admin/metrics", web::get().to(get_metrics))
            .route("/admin/reset", web::post().to(reset_metrics))
            .service(
                web::scope("/app")
                    .wrap(HitCounter::new(metrics.clone()))
                    .service(fs::Files::new("", static_dir.as_str()).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
