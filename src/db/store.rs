use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{
    CreateGroup, CreateService, Failure, Group, Hit, NewFailure, NewHit, Service,
};

/// Persistence contract required by the core.
///
/// Lookups return `Ok(None)` when no row matches; translating that into a
/// `NotFound` is the caller's job. Listings return rows in identity (id) order
/// so that order ties stay stable between reads.
#[async_trait]
pub trait Store: Send + Sync {
    async fn group_by_id(&self, id: i64) -> AppResult<Option<Group>>;
    async fn group_by_name(&self, name: &str) -> AppResult<Option<Group>>;
    /// `limit = None` returns every row from `offset`
    async fn groups(&self, limit: Option<i64>, offset: i64) -> AppResult<Vec<Group>>;
    async fn insert_group(&self, input: &CreateGroup) -> AppResult<Group>;
    async fn save_group(&self, group: &Group) -> AppResult<Group>;
    /// Returns false when no row was deleted
    async fn remove_group(&self, id: i64) -> AppResult<bool>;

    async fn service_by_id(&self, id: i64) -> AppResult<Option<Service>>;
    async fn service_by_name(&self, name: &str) -> AppResult<Option<Service>>;
    async fn services(&self, limit: Option<i64>, offset: i64) -> AppResult<Vec<Service>>;
    async fn services_in_group(&self, group_id: i64) -> AppResult<Vec<Service>>;
    async fn insert_service(&self, input: &CreateService) -> AppResult<Service>;
    async fn save_service(&self, service: &Service) -> AppResult<Service>;
    async fn remove_service(&self, id: i64) -> AppResult<bool>;

    async fn insert_hit(&self, hit: &NewHit) -> AppResult<Hit>;
    /// Hits of one service with `start <= created_at <= end`
    async fn hits_between(
        &self,
        service_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Hit>>;
    async fn remove_hits(&self, service_id: i64) -> AppResult<u64>;

    async fn insert_failure(&self, failure: &NewFailure) -> AppResult<Failure>;
    /// Failures of one service with `start <= created_at <= end`
    async fn failures_between(
        &self,
        service_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Failure>>;
    async fn remove_failures(&self, service_id: i64) -> AppResult<u64>;

    /// Round-trip check used by the readiness probe
    async fn ping(&self) -> bool;
}
