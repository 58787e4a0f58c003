use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::services::Catalog;

#[derive(Serialize)]
pub struct LivenessResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    checks: ReadinessChecks,
    /// Entity-store query counters, keyed `"<kind>.<op>"`
    queries: BTreeMap<String, u64>,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    store: &'static str,
}

/// Liveness check - is the process running?
/// Returns 200 if the server is alive.
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(LivenessResponse { status: "ok" })
}

/// Readiness check - is the service ready to handle requests?
/// Returns 200 if the store answers, 503 otherwise.
pub async fn readiness(catalog: web::Data<Catalog>) -> HttpResponse {
    let (status, store_status, http_status) = if catalog.is_ready().await {
        ("ready", "ok", StatusCode::OK)
    } else {
        ("not_ready", "error", StatusCode::SERVICE_UNAVAILABLE)
    };

    let response = ReadinessResponse {
        status,
        checks: ReadinessChecks {
            store: store_status,
        },
        queries: catalog.metrics().snapshot(),
    };

    HttpResponse::build(http_status).json(response)
}

/// Configure health routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(liveness))
            .route("/ready", web::get().to(readiness)),
    );
}
