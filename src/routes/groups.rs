use actix_web::{web, HttpResponse};

use crate::auth::require_admin;
use crate::error::AppResult;
use crate::models::{CreateGroup, UpdateGroup};
use crate::pagination::ListGroupsQuery;
use crate::services::{Caller, Catalog, OrderChange};

/// GET /api/groups - List visible groups, one page at a time
pub async fn list_groups(
    catalog: web::Data<Catalog>,
    query: web::Query<ListGroupsQuery>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    let groups = catalog.list_groups(query.page, query.all, caller).await?;
    Ok(HttpResponse::Ok().json(groups))
}

/// GET /api/groups/{id} - Get a group by ID
pub async fn get_group(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    let group = catalog.get_group(path.into_inner(), caller).await?;
    Ok(HttpResponse::Ok().json(group))
}

/// GET /api/groups/name/{name} - Get a group by name
pub async fn get_group_by_name(
    catalog: web::Data<Catalog>,
    path: web::Path<String>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    let group = catalog.get_group_by_name(&path.into_inner(), caller).await?;
    Ok(HttpResponse::Ok().json(group))
}

/// POST /api/groups - Create a new group
pub async fn create_group(
    catalog: web::Data<Catalog>,
    body: web::Json<CreateGroup>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    let group = catalog.create_group(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(group))
}

/// PATCH /api/groups/{id} - Update a group
pub async fn update_group(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    body: web::Json<UpdateGroup>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    let group = catalog
        .update_group(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(group))
}

/// DELETE /api/groups/{id} - Delete a group (its services are kept)
pub async fn delete_group(
    catalog: web::Data<Catalog>,
    path: web::Path<i64>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    catalog.delete_group(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/groups/reorder - Apply a batch of order values
pub async fn reorder_groups(
    catalog: web::Data<Catalog>,
    body: web::Json<Vec<OrderChange>>,
    caller: Caller,
) -> AppResult<HttpResponse> {
    require_admin(caller)?;
    let changes = catalog.reorder_groups(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(changes))
}

/// Configure group routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/groups")
            .route("", web::get().to(list_groups))
            .route("", web::post().to(create_group))
            .route("/reorder", web::post().to(reorder_groups))
            .route("/name/{name}", web::get().to(get_group_by_name))
            .route("/{id}", web::get().to(get_group))
            .route("/{id}", web::patch().to(update_group))
            .route("/{id}", web::delete().to(delete_group)),
    );
}
