use actix_web::{web, HttpResponse};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::auth::require_admin;
use crate::error::AppResult;
use crate::models::{CreateService, PatchServiceStatus, UpdateService};
use crate::pagination::{GroupNameQuery, WindowQuery};
use crate::services::{Caller, Catalog, GraphMetric, OrderChange};

#[derive(Serialize)]
struct DeletedResponse {
    deleted: u64,
}

/// GET /api/services - List visible services in display order
pub async fn list_services(
    catalog: web::Data<Catalog>,
    query: web::Query<GroupNameQuery>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    let services = catalog.list_services(caller, query.group_name()).await?;
    Ok(HttpResponse::Ok().json(services))
}

/// GET /api/services/{id} - Get a service by ID
pub async fn get_service(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    query: web::Query<GroupNameQuery>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    let service = catalog
        .get_service(path.into_inner(), caller, query.group_name())
        .await?;
    Ok(HttpResponse::Ok().json(service))
}

/// POST /api/services - Create a new service
pub async fn create_service(
    catalog: web::Data<Catalog>,
    body: web::Json<CreateService>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    let service = catalog.create_service(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(service))
}

/// PATCH /api/services/{id} - Update a service
pub async fn update_service(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    body: web::Json<UpdateService>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    let service = catalog
        .update_service(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(service))
}

/// PATCH /api/services/{id}/status - Force a service online or offline
pub async fn patch_service_status(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    body: web::Json<PatchServiceStatus>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    let service = catalog
        .patch_service(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(service))
}

/// DELETE /api/services/{id} - Delete a service and its observations
pub async fn delete_service(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    catalog.delete_service(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/services/reorder - Apply a batch of order values
pub async fn reorder_services(
    catalog: web::Data<Catalog>,
    body: web::Json<Vec<OrderChange>>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    let changes = catalog.reorder_services(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(changes))
}

/// GET /api/services/{id}/hits - Raw hits inside a window
pub async fn list_hits(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    query: web::Query<WindowQuery>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    let service = catalog
        .get_service(path.into_inner(), caller, query.group_name())
        .await?;
    let window = catalog.window(query.start, query.end)?;
    let hits = catalog.list_hits(&service, &window).await?;
    Ok(HttpResponse::Ok().json(hits))
}

/// GET /api/services/{id}/failures - Raw failures inside a window
pub async fn list_failures(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    query: web::Query<WindowQuery>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    let service = catalog
        .get_service(path.into_inner(), caller, query.group_name())
        .await?;
    let window = catalog.window(query.start, query.end)?;
    let failures = catalog.list_failures(&service, &window).await?;
    Ok(HttpResponse::Ok().json(failures))
}

/// DELETE /api/services/{id}/hits - Delete every hit of a service
pub async fn delete_hits(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    let deleted = catalog.delete_hits(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DeletedResponse { deleted }))
}

/// DELETE /api/services/{id}/failures - Delete every failure of a service
pub async fn delete_failures(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    let deleted = catalog.delete_failures(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DeletedResponse { deleted }))
}

async fn graph(
    catalog: &Catalog,
    id: i64,
    query: &WindowQuery,
    caller: Caller,
    metric: GraphMetric,
) -> AppResult<HttpResponse> {
    let service = catalog.get_service(id, caller, query.group_name()).await?;
    let window = catalog.window(query.start, query.end)?;
    let buckets = catalog.bucket_count(query.buckets)?;

    // Cancels the aggregation if the client goes away
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let points = catalog
        .graph_data(&service, metric, window, buckets, cancel)
        .await?;
    Ok(HttpResponse::Ok().json(points))
}

/// GET /api/services/{id}/latency - Average latency series (ms)
pub async fn latency_data(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    query: web::Query<WindowQuery>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    graph(&catalog, path.into_inner(), &query, caller, GraphMetric::Latency).await
}

/// GET /api/services/{id}/ping - Average ping series (ms)
pub async fn ping_data(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    query: web::Query<WindowQuery>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    graph(&catalog, path.into_inner(), &query, caller, GraphMetric::Ping).await
}

/// GET /api/services/{id}/failure_data - Failure count series
pub async fn failure_data(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    query: web::Query<WindowQuery>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    graph(&catalog, path.into_inner(), &query, caller, GraphMetric::Failures).await
}

/// GET /api/services/{id}/uptime - Uptime summary for a window
pub async fn uptime(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    query: web::Query<WindowQuery>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    let service = catalog
        .get_service(path.into_inner(), caller, query.group_name())
        .await?;
    let window = catalog.window(query.start, query.end)?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let summary = catalog.uptime(&service, window, cancel).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// Configure service routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/services")
            .route("", web::get().to(list_services))
            .route("", web::post().to(create_service))
            .route("/reorder", web::post().to(reorder_services))
            .route("/{id}", web::get().to(get_service))
            .route("/{id}", web::patch().to(update_service))
            .route("/{id}", web::delete().to(delete_service))
            .route("/{id}/status", web::patch().to(patch_service_status))
            .route("/{id}/hits", web::get().to(list_hits))
            .route("/{id}/hits", web::delete().to(delete_hits))
            .route("/{id}/failures", web::get().to(list_failures))
            .route("/{id}/failures", web::delete().to(delete_failures))
            .route("/{id}/latency", web::get().to(latency_data))
            .route("/{id}/ping", web::get().to(ping_data))
            .route("/{id}/failure_data", web::get().to(failure_data))
            .route("/{id}/uptime", web::get().to(uptime)),
    );
}
