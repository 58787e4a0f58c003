//! Integration tests for service operations and observation queries

use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tokio_util::sync::CancellationToken;

use upstat::db::Store;
use upstat::error::AppError;
use upstat::models::{FailureKind, PatchServiceStatus, UpdateService};
use upstat::services::monitored::DEFAULT_TRIGGER_ISSUE;
use upstat::services::{Caller, GraphMetric, OrderChange, Window};

use crate::common::{at, TestCatalog};

fn names(services: &[upstat::models::Service]) -> Vec<&str> {
    services.iter().map(|s| s.name.as_str()).collect()
}

/// Public group "core" with a public, a private and an unset service,
/// plus one public service in a second group.
async fn seeded() -> TestCatalog {
    let t = TestCatalog::new();
    let core = t.group("core", Some(true), 0).await;
    let edge = t.group("edge", Some(true), 1).await;
    t.service("api", Some(core.id), Some(true), 2).await;
    t.service("db", Some(core.id), Some(false), 0).await;
    t.service("cache", Some(core.id), None, 1).await;
    t.service("cdn", Some(edge.id), Some(true), 0).await;
    t
}

#[rstest]
#[case(None, vec![])]
#[case(Some(""), vec![])]
#[case(Some("missing"), vec![])]
#[case(Some("core"), vec!["api"])]
#[case(Some("edge"), vec!["cdn"])]
#[tokio::test]
async fn test_anonymous_listing_needs_group_name(
    #[case] group_name: Option<&str>,
    #[case] expected: Vec<&str>,
) {
    let t = seeded().await;
    let listed = t
        .catalog
        .list_services(Caller::Anonymous, group_name)
        .await
        .unwrap();
    assert_eq!(names(&listed), expected);
}

#[rstest]
#[case(Caller::Reader)]
#[case(Caller::Admin)]
#[tokio::test]
async fn test_authenticated_listing_returns_everything_in_order(#[case] caller: Caller) {
    let t = seeded().await;
    let listed = t.catalog.list_services(caller, Some("edge")).await.unwrap();
    assert_eq!(names(&listed), vec!["db", "cdn", "cache", "api"]);
}

#[tokio::test]
async fn test_deleted_service_disappears_for_every_caller() {
    let t = seeded().await;
    let core = t.catalog.get_group_by_name("core", Caller::Admin).await.unwrap();
    let api = t
        .catalog
        .services()
        .find_by_name("api")
        .await
        .unwrap();

    t.catalog.delete_service(api.id).await.unwrap();

    for caller in [Caller::Anonymous, Caller::Reader, Caller::Admin] {
        let listed = t
            .catalog
            .list_services(caller, Some(core.name.as_str()))
            .await
            .unwrap();
        assert!(!names(&listed).contains(&"api"));

        let fetched = t.catalog.get_service(api.id, caller, Some("core")).await;
        assert!(matches!(fetched, Err(AppError::NotFound { .. })));
    }
}

#[tokio::test]
async fn test_get_service_checks_group_membership() {
    let t = seeded().await;
    let api = t.catalog.services().find_by_name("api").await.unwrap();

    let ok = t
        .catalog
        .get_service(api.id, Caller::Anonymous, Some("core"))
        .await
        .unwrap();
    assert_eq!(ok.id, api.id);

    for name in [Some("edge"), Some("missing"), None] {
        let denied = t.catalog.get_service(api.id, Caller::Anonymous, name).await;
        assert!(matches!(denied, Err(AppError::NotAuthenticated(_))));
    }
}

#[tokio::test]
async fn test_private_service_is_hidden_from_readers() {
    let t = seeded().await;
    let db = t.catalog.services().find_by_name("db").await.unwrap();

    let anonymous = t.catalog.get_service(db.id, Caller::Anonymous, Some("core")).await;
    let reader = t.catalog.get_service(db.id, Caller::Reader, None).await;
    let admin = t.catalog.get_service(db.id, Caller::Admin, None).await;

    assert!(matches!(anonymous, Err(AppError::NotAuthenticated(_))));
    assert!(matches!(reader, Err(AppError::NotAuthenticated(_))));
    assert!(admin.is_ok());
}

#[tokio::test]
async fn test_update_with_zero_group_ungroups_service() {
    let t = seeded().await;
    let api = t.catalog.services().find_by_name("api").await.unwrap();

    let updated = t
        .catalog
        .update_service(
            api.id,
            UpdateService {
                group_id: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.group_id, None);
    let listed = t
        .catalog
        .list_services(Caller::Anonymous, Some("core"))
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_reorder_services() {
    let t = seeded().await;
    let api = t.catalog.services().find_by_name("api").await.unwrap();

    t.catalog
        .reorder_services(vec![OrderChange {
            id: api.id,
            order: -1,
        }])
        .await
        .unwrap();

    let listed = t.catalog.list_services(Caller::Admin, None).await.unwrap();
    assert_eq!(listed[0].name, "api");
}

#[tokio::test]
async fn test_patch_offline_records_trigger_failure() {
    let t = TestCatalog::new();
    let service = t.service("api", None, Some(true), 0).await;

    let patched = t
        .catalog
        .patch_service(
            service.id,
            PatchServiceStatus {
                online: false,
                issue: None,
                latency: 0,
            },
        )
        .await
        .unwrap();

    assert!(!patched.online);
    assert_eq!(patched.last_issue.as_deref(), Some(DEFAULT_TRIGGER_ISSUE));

    let now = Utc::now();
    let failures = t
        .store
        .failures_between(service.id, now - Duration::hours(1), now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, FailureKind::Trigger);
}

#[tokio::test]
async fn test_patch_online_records_hit() {
    let t = TestCatalog::new();
    let service = t.service("api", None, Some(true), 0).await;

    let patched = t
        .catalog
        .patch_service(
            service.id,
            PatchServiceStatus {
                online: true,
                issue: None,
                latency: 1500,
            },
        )
        .await
        .unwrap();
    assert!(patched.online);
    assert_eq!(patched.latency, 1500);

    let now = Utc::now();
    let hits = t
        .store
        .hits_between(service.id, now - Duration::hours(1), now + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].latency, 1500);
}

#[tokio::test]
async fn test_latency_series_is_averaged_in_milliseconds() {
    let t = TestCatalog::new();
    let service = t.service("api", None, Some(true), 0).await;
    t.hit(service.id, 5, 10_000, 1_000).await;
    t.hit(service.id, 5, 20_000, 3_000).await;

    let window = Window::new(at(0), at(10)).unwrap();
    let latency = t
        .catalog
        .graph_data(&service, GraphMetric::Latency, window, 1, CancellationToken::new())
        .await
        .unwrap();
    let ping = t
        .catalog
        .graph_data(&service, GraphMetric::Ping, window, 1, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(latency[0].value, Some(15.0));
    assert_eq!(ping[0].value, Some(2.0));
}

#[tokio::test]
async fn test_failure_series_counts_per_bucket() {
    let t = TestCatalog::new();
    let service = t.service("api", None, Some(true), 0).await;
    t.failure(service.id, 1, FailureKind::Organic).await;
    t.failure(service.id, 2, FailureKind::Trigger).await;
    t.failure(service.id, 99, FailureKind::Organic).await;

    let window = Window::new(at(0), at(100)).unwrap();
    let points = t
        .catalog
        .graph_data(&service, GraphMetric::Failures, window, 4, CancellationToken::new())
        .await
        .unwrap();

    let values: Vec<Option<f64>> = points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![Some(2.0), Some(0.0), Some(0.0), Some(1.0)]);
}

#[tokio::test]
async fn test_cancelled_graph_returns_error() {
    let t = TestCatalog::new();
    let service = t.service("api", None, Some(true), 0).await;
    t.hit(service.id, 5, 1_000, 1_000).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let window = Window::new(at(0), at(10)).unwrap();
    let result = t
        .catalog
        .graph_data(&service, GraphMetric::Latency, window, 2, cancel)
        .await;
    assert!(matches!(result, Err(AppError::Cancelled)));
}

#[tokio::test]
async fn test_uptime_over_stored_observations() {
    let t = TestCatalog::new();
    let service = t.service("api", None, Some(true), 0).await;
    t.hit(service.id, 0, 1_000, 1_000).await;
    t.failure(service.id, 10, FailureKind::Organic).await;
    t.hit(service.id, 20, 1_000, 1_000).await;

    let window = Window::new(at(0), at(20)).unwrap();
    let summary = t
        .catalog
        .uptime(&service, window, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.uptime_percentage, 50.0);
    assert_eq!(summary.total_checks, 3);
    assert_eq!(summary.total_failures, 1);
}

#[tokio::test]
async fn test_bulk_delete_observations() {
    let t = TestCatalog::new();
    let service = t.service("api", None, Some(true), 0).await;
    t.hit(service.id, 1, 1_000, 1_000).await;
    t.hit(service.id, 2, 1_000, 1_000).await;
    t.failure(service.id, 3, FailureKind::Organic).await;

    assert_eq!(t.catalog.delete_hits(service.id).await.unwrap(), 2);
    assert_eq!(t.catalog.delete_failures(service.id).await.unwrap(), 1);

    let window = Window::new(at(0), at(10)).unwrap();
    assert!(t.catalog.list_hits(&service, &window).await.unwrap().is_empty());
    assert!(t.catalog.list_failures(&service, &window).await.unwrap().is_empty());
}

#[rstest]
#[case(None, Ok(24))]
#[case(Some(60), Ok(60))]
#[case(Some(0), Err(()))]
#[case(Some(1001), Err(()))]
fn test_bucket_count_bounds(#[case] requested: Option<usize>, #[case] expected: Result<usize, ()>) {
    let t = TestCatalog::new();
    let actual = t.catalog.bucket_count(requested).map_err(|_| ());
    assert_eq!(actual, expected);
}

#[test]
fn test_window_defaults_and_validation() {
    let t = TestCatalog::new();

    let explicit = t.catalog.window(Some(0), Some(100)).unwrap();
    assert_eq!(explicit.start, at(0));
    assert_eq!(explicit.end, at(100));

    let defaulted = t.catalog.window(None, Some(100_000)).unwrap();
    assert_eq!(defaulted.span(), Duration::hours(24));

    assert!(matches!(
        t.catalog.window(Some(100), Some(0)),
        Err(AppError::Validation(_))
    ));

    // Defaulted start would fall before the earliest representable instant
    let earliest = DateTime::<Utc>::MIN_UTC.timestamp() + 1;
    assert!(matches!(
        t.catalog.window(None, Some(earliest)),
        Err(AppError::Validation(_))
    ));
    assert!(t.catalog.window(Some(earliest), Some(earliest + 60)).is_ok());
}
