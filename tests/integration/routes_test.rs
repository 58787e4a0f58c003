//! Integration tests for the HTTP routes
//!
//! Runs the group, service and health routes over the in-memory store and
//! checks caller resolution from Bearer tokens and session cookies.

use actix_session::{storage::CookieSessionStore, Session, SessionMiddleware};
use actix_web::{cookie::Key, test, web, App, HttpResponse};
use serde_json::{json, Value};
use std::sync::Arc;

use upstat::auth::set_user_session;
use upstat::config::{Config, GraphConfig, ListingConfig, SecurityConfig};
use upstat::db::MemoryStore;
use upstat::metrics::QueryMetrics;
use upstat::models::{CreateGroup, CreateService};
use upstat::routes;
use upstat::services::Catalog;

const API_SECRET: &str = "test-secret";

fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: None,
        security: SecurityConfig {
            ssl_proxy: false,
            session_secret_key: None,
            api_secret: Some(API_SECRET.to_string()),
        },
        listing: ListingConfig::default(),
        graph: GraphConfig::default(),
    }
}

fn create_catalog() -> web::Data<Catalog> {
    web::Data::new(Catalog::new(
        Arc::new(MemoryStore::new()),
        Arc::new(QueryMetrics::new()),
        ListingConfig::default(),
        GraphConfig::default(),
    ))
}

/// Stands in for the external login flow
async fn test_login(session: Session, path: web::Path<bool>) -> HttpResponse {
    match set_user_session(&session, 1, path.into_inner()) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(_) => HttpResponse::InternalServerError().finish(),
    }
}

macro_rules! test_app {
    ($catalog:expr) => {
        test::init_service(
            App::new()
                .app_data($catalog.clone())
                .app_data(web::Data::new(create_test_config()))
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_name("upstat_session".to_string())
                        .cookie_secure(false)
                        .build(),
                )
                .route("/test/login/{admin}", web::post().to(test_login))
                .configure(routes::health::configure)
                .configure(routes::groups::configure)
                .configure(routes::services::configure),
        )
        .await
    };
}

fn admin_header() -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", API_SECRET))
}

/// Public group "core" holding public "api" and private "db"
async fn seed(catalog: &Catalog) -> (i64, i64, i64) {
    let core = catalog
        .create_group(CreateGroup {
            name: "core".to_string(),
            public: Some(true),
            order: 0,
        })
        .await
        .unwrap();
    let api = catalog
        .create_service(CreateService {
            name: "api".to_string(),
            domain: "https://api.example.com".to_string(),
            group_id: Some(core.id),
            public: Some(true),
            order: 0,
        })
        .await
        .unwrap();
    let db = catalog
        .create_service(CreateService {
            name: "db".to_string(),
            domain: "postgres://db.example.com".to_string(),
            group_id: Some(core.id),
            public: Some(false),
            order: 1,
        })
        .await
        .unwrap();
    (core.id, api.id, db.id)
}

// =============================================================================
// Health
// =============================================================================

#[actix_web::test]
async fn test_liveness_and_readiness() {
    let catalog = create_catalog();
    let app = test_app!(catalog);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "ok");

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["checks"]["store"], "ok");
    assert_eq!(body["queries"]["group.find"], 0);
}

#[actix_web::test]
async fn test_readiness_reports_query_counters() {
    let catalog = create_catalog();
    seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::get().uri("/api/groups").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get().uri("/health/ready").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["queries"]["group.create"], 1);
    assert_eq!(body["queries"]["service.create"], 2);
    assert_eq!(body["queries"]["group.find"], 1);
    assert_eq!(body["queries"].as_object().map(|q| q.len()), Some(8));
}

// =============================================================================
// Groups
// =============================================================================

#[actix_web::test]
async fn test_anonymous_cannot_create_group() {
    let catalog = create_catalog();
    let app = test_app!(catalog);

    let req = test::TestRequest::post()
        .uri("/api/groups")
        .set_json(json!({ "name": "core" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 403);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "NotAuthenticated");
}

#[actix_web::test]
async fn test_admin_creates_and_lists_groups() {
    let catalog = create_catalog();
    let app = test_app!(catalog);

    let req = test::TestRequest::post()
        .uri("/api/groups")
        .insert_header(admin_header())
        .set_json(json!({ "name": "core", "public": true, "order_id": 2 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["name"], "core");
    assert_eq!(created["order_id"], 2);

    let req = test::TestRequest::get().uri("/api/groups").to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 1);
}

#[actix_web::test]
async fn test_wrong_bearer_token_is_anonymous() {
    let catalog = create_catalog();
    let app = test_app!(catalog);

    let req = test::TestRequest::post()
        .uri("/api/groups")
        .insert_header(("Authorization", "Bearer wrong"))
        .set_json(json!({ "name": "core" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_empty_group_name_is_bad_request() {
    let catalog = create_catalog();
    let app = test_app!(catalog);

    let req = test::TestRequest::post()
        .uri("/api/groups")
        .insert_header(admin_header())
        .set_json(json!({ "name": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_duplicate_group_name_is_conflict() {
    let catalog = create_catalog();
    seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::post()
        .uri("/api/groups")
        .insert_header(admin_header())
        .set_json(json!({ "name": "core" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
}

#[actix_web::test]
async fn test_missing_group_is_not_found() {
    let catalog = create_catalog();
    let app = test_app!(catalog);

    let req = test::TestRequest::get().uri("/api/groups/42").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_reorder_accepts_group_key() {
    let catalog = create_catalog();
    let (core, _, _) = seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::post()
        .uri("/api/groups/reorder")
        .insert_header(admin_header())
        .set_json(json!([{ "group": core, "order": 7 }]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/groups/{}", core))
        .to_request();
    let group: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(group["order_id"], 7);
}

// =============================================================================
// Services
// =============================================================================

#[actix_web::test]
async fn test_anonymous_service_listing_by_group_name() {
    let catalog = create_catalog();
    seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::get().uri("/api/services").to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert!(listed.is_empty());

    let req = test::TestRequest::get()
        .uri("/api/services?group_name=core")
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "api");
}

#[actix_web::test]
async fn test_admin_sees_private_services() {
    let catalog = create_catalog();
    seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::get()
        .uri("/api/services")
        .insert_header(admin_header())
        .to_request();
    let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.len(), 2);
}

#[actix_web::test]
async fn test_service_fetch_needs_matching_group() {
    let catalog = create_catalog();
    let (_, api, _) = seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::get()
        .uri(&format!("/api/services/{}?group_name=core", api))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/services/{}?group_name=other", api))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_session_reader_is_authenticated_but_not_admin() {
    let catalog = create_catalog();
    let (_, api, db) = seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::post().uri("/test/login/false").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "upstat_session")
        .expect("session cookie")
        .into_owned();

    // Readers may fetch public services without a group name
    let req = test::TestRequest::get()
        .uri(&format!("/api/services/{}", api))
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // but not private ones
    let req = test::TestRequest::get()
        .uri(&format!("/api/services/{}", db))
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/services/{}", api))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_session_admin_can_delete_service() {
    let catalog = create_catalog();
    let (_, api, _) = seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::post().uri("/test/login/true").to_request();
    let resp = test::call_service(&app, req).await;
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "upstat_session")
        .expect("session cookie")
        .into_owned();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/services/{}", api))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = test::TestRequest::get()
        .uri(&format!("/api/services/{}?group_name=core", api))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_status_patch_and_failure_series() {
    let catalog = create_catalog();
    let (_, api, _) = seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/services/{}/status", api))
        .insert_header(admin_header())
        .set_json(json!({ "online": false, "issue": "maintenance" }))
        .to_request();
    let service: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(service["online"], false);
    assert_eq!(service["last_issue"], "maintenance");

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/services/{}/failure_data?group_name=core&buckets=6",
            api
        ))
        .to_request();
    let points: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(points.len(), 6);
    let total: f64 = points.iter().filter_map(|p| p["value"].as_f64()).sum();
    assert_eq!(total, 1.0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/services/{}/uptime?group_name=core", api))
        .to_request();
    let summary: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(summary["uptime_percentage"], 100.0);
    assert_eq!(summary["total_failures"], 1);
}

#[actix_web::test]
async fn test_empty_latency_buckets_are_null() {
    let catalog = create_catalog();
    let (_, api, _) = seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/services/{}/latency?group_name=core&start=0&end=100&buckets=10",
            api
        ))
        .to_request();
    let points: Vec<Value> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(points.len(), 10);
    assert!(points.iter().all(|p| p["value"].is_null()));
}

#[actix_web::test]
async fn test_invalid_window_and_bucket_count_are_rejected() {
    let catalog = create_catalog();
    let (_, api, _) = seed(&catalog).await;
    let app = test_app!(catalog);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/services/{}/ping?group_name=core&start=100&end=0",
            api
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::get()
        .uri(&format!("/api/services/{}/ping?group_name=core&buckets=0", api))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_bulk_delete_reports_count() {
    let catalog = create_catalog();
    let (_, api, _) = seed(&catalog).await;
    let app = test_app!(catalog);

    for online in [true, true] {
        let req = test::TestRequest::patch()
            .uri(&format!("/api/services/{}/status", api))
            .insert_header(admin_header())
            .set_json(json!({ "online": online, "latency": 1200 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
    }

    let req = test::TestRequest::delete()
        .uri(&format!("/api/services/{}/hits", api))
        .insert_header(admin_header())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["deleted"], 2);
}
