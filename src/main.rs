use actix_cors::Cors;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, middleware, web, App, HttpServer};
use std::sync::Arc;

use upstat::config;
use upstat::db;
use upstat::metrics::QueryMetrics;
use upstat::routes;
use upstat::services::Catalog;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load configuration
    let config = config::Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("Starting Upstat server on {}:{}", config.host, config.port);

    let store = db::open_store(config.database.as_ref()).await.map_err(|e| {
        log::error!("Store setup error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    if config.security.api_secret.is_none() {
        log::warn!("API_SECRET not set, admin access is only possible through sessions");
    }

    let catalog = web::Data::new(Catalog::new(
        store,
        Arc::new(QueryMetrics::new()),
        config.listing.clone(),
        config.graph.clone(),
    ));

    // Session secret key from config or generate random (with warning)
    let secret_key = match &config.security.session_secret_key {
        Some(key) => key.clone(),
        None => {
            log::warn!(
                "SESSION_SECRET_KEY not set, using random key (sessions won't persist across restarts)"
            );
            use rand::Rng;
            let random_bytes: Vec<u8> = (0..64).map(|_| rand::rng().random()).collect();
            hex::encode(random_bytes)
        }
    };

    let key = Key::from(secret_key.as_bytes());

    // Clone values for the closure
    let host = config.host.clone();
    let port = config.port;

    let server = HttpServer::new(move || {
        // Status pages are embedded from arbitrary origins
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CONTENT_TYPE,
            ])
            .max_age(3600);

        App::new()
            .app_data(catalog.clone())
            .app_data(web::Data::new(config.clone()))
            // Middleware
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .wrap(cors) // CORS must be before SessionMiddleware
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_name("upstat_session".to_string())
                    .cookie_secure(config.security.ssl_proxy)
                    .cookie_http_only(true)
                    .cookie_same_site(actix_web::cookie::SameSite::Lax)
                    .build(),
            )
            .configure(routes::health::configure)
            .configure(routes::groups::configure)
            .configure(routes::services::configure)
    })
    .bind((host.as_str(), port))?
    .shutdown_timeout(30)
    .run();

    // Spawn graceful shutdown handler
    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutdown signal received, stopping server...");
        server_handle.stop(true).await;
    });

    server.await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
