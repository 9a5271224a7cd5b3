use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod kiosk;
mod model;
mod models;
mod routes;
mod service;
mod state;
mod store;
mod utils;

use config::Config;
use db::init_db;
use kiosk::KioskSession;
use state::AppState;
use store::MySqlStore;

use crate::docs::ApiDoc;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "RFID attendance service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;

    if config.auto_migrate {
        db::ensure_schema(&pool).await?;
    }
    if let Some(password) = &config.bootstrap_admin_password {
        db::bootstrap_admin(&pool, password).await?;
    }

    let store = Arc::new(MySqlStore::new(pool));
    let state = Data::new(AppState::new(store.clone(), store));

    if config.kiosk_stdin {
        let session = Arc::new(KioskSession::new(
            state.resolver.clone(),
            config.kiosk_clear_after,
        ));
        let idle_timeout = config.tag_idle_timeout;
        actix_web::rt::spawn(async move {
            if let Err(e) = kiosk::session::run_stdin(session, idle_timeout).await {
                error!(error = %e, "Kiosk input failed");
            }
        });
    }

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
