use crate::{
    api::attendance,
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, middleware::from_fn, web};
use serde_json::json;
use std::sync::Arc;

fn bad_request<E>(message: String, err: E) -> actix_web::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    let resp = HttpResponse::BadRequest().json(json!({ "error": message }));
    InternalError::from_response(err, resp).into()
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            (60_000 / requests_per_min as u64).max(1)
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min.max(1))
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("per_millisecond and burst_size are non-zero");
        Governor::new(&cfg)
    }

    let kiosk_limiter = Arc::new(build_limiter(config.rate_kiosk_per_min));
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Malformed input answers in the same `{"error": ...}` shape as handler errors
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        bad_request(format!("Invalid request body: {}", err), err)
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        bad_request(format!("Invalid query: {}", err), err)
    }));
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req| {
        bad_request(format!("Invalid path: {}", err), err)
    }));

    // Public kiosk endpoint; registered ahead of the protected scope so it wins the match
    cfg.service(
        web::resource(format!("{}/attendance/add", config.api_prefix))
            .wrap(kiosk_limiter)
            .route(web::post().to(attendance::add_attendance)),
    );

    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/attendance")
                    // /attendance/logs
                    .service(web::resource("/logs").route(web::get().to(attendance::list_logs)))
                    // /attendance/logs/export
                    .service(
                        web::resource("/logs/export")
                            .route(web::get().to(attendance::export_logs)),
                    )
                    // /attendance/employees/{id}/state
                    .service(
                        web::resource("/employees/{id}/state")
                            .route(web::get().to(attendance::employee_state)),
                    ),
            ),
    );
}
