//! Group/service facade used by the HTTP layer.
//!
//! Every call re-reads current state from the store; nothing here caches
//! visibility flags or order values.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{GraphConfig, ListingConfig};
use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::metrics::QueryMetrics;
use crate::models::{
    CreateGroup, CreateService, Failure, Group, Hit, PatchServiceStatus, Service, UpdateGroup,
    UpdateService,
};
use crate::services::aggregation::{self, Aggregation, BucketPoint, Sample, UptimeSummary, Window};
use crate::services::groups::GroupStore;
use crate::services::monitored::ServiceStore;
use crate::services::ordering::{apply_order, sort_by_order, OrderChange};
use crate::services::visibility::{
    can_list_group, can_read, can_read_service, select_visible, Caller, GroupCredential,
};

/// Series available for a single service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphMetric {
    /// Average hit latency in milliseconds
    Latency,
    /// Average hit ping time in milliseconds
    Ping,
    /// Failure count
    Failures,
}

impl GraphMetric {
    pub fn aggregation(&self) -> Aggregation {
        match self {
            GraphMetric::Latency | GraphMetric::Ping => Aggregation::Average,
            GraphMetric::Failures => Aggregation::Count,
        }
    }
}

/// Microseconds to milliseconds
fn micros_to_millis(value: i64) -> f64 {
    value as f64 / 1000.0
}

pub struct Catalog {
    store: Arc<dyn Store>,
    groups: GroupStore,
    services: ServiceStore,
    metrics: Arc<QueryMetrics>,
    listing: ListingConfig,
    graph: GraphConfig,
}

impl Catalog {
    pub fn new(
        store: Arc<dyn Store>,
        metrics: Arc<QueryMetrics>,
        listing: ListingConfig,
        graph: GraphConfig,
    ) -> Self {
        Self {
            groups: GroupStore::new(store.clone(), metrics.clone()),
            services: ServiceStore::new(store.clone(), metrics.clone()),
            metrics,
            store,
            listing,
            graph,
        }
    }

    pub fn groups(&self) -> &GroupStore {
        &self.groups
    }

    pub fn services(&self) -> &ServiceStore {
        &self.services
    }

    pub fn metrics(&self) -> &QueryMetrics {
        &self.metrics
    }

    /// True when the backing store answers
    pub async fn is_ready(&self) -> bool {
        self.store.ping().await
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// One page of groups the caller may see, in display order.
    /// Pages are zero-based; a page past the addressable range is empty.
    pub async fn list_groups(
        &self,
        page: i64,
        include_all: bool,
        caller: Caller,
    ) -> AppResult<Vec<Group>> {
        let limit = self.listing.groups_per_page;
        let Some(offset) = page.max(0).checked_mul(limit) else {
            return Ok(Vec::new());
        };

        let groups = self.groups.list(Some(limit), offset).await?;
        let mut visible = select_visible(groups, |g| can_list_group(caller, g, include_all));
        sort_by_order(&mut visible);
        Ok(visible)
    }

    pub async fn get_group(&self, id: i64, caller: Caller) -> AppResult<Group> {
        let group = self.groups.find(id).await?;
        Self::authorize_group(group, caller)
    }

    pub async fn get_group_by_name(&self, name: &str, caller: Caller) -> AppResult<Group> {
        let group = self.groups.find_by_name(name).await?;
        Self::authorize_group(group, caller)
    }

    fn authorize_group(group: Group, caller: Caller) -> AppResult<Group> {
        if !can_read(caller, &group) {
            return Err(AppError::NotAuthenticated(format!(
                "group {} is not public",
                group.id
            )));
        }
        Ok(group)
    }

    pub async fn create_group(&self, input: CreateGroup) -> AppResult<Group> {
        self.groups.create(input).await
    }

    pub async fn update_group(&self, id: i64, update: UpdateGroup) -> AppResult<Group> {
        let mut group = self.groups.find(id).await?;
        group.apply(update);
        self.groups.update(&group).await
    }

    pub async fn delete_group(&self, id: i64) -> AppResult<Group> {
        let group = self.groups.find(id).await?;
        self.groups.delete(&group).await?;
        Ok(group)
    }

    pub async fn reorder_groups(&self, changes: Vec<OrderChange>) -> AppResult<Vec<OrderChange>> {
        apply_order(&self.groups, changes).await
    }

    // =========================================================================
    // Services
    // =========================================================================

    /// Services visible to the caller, in display order.
    ///
    /// Authenticated callers get every service. Anonymous callers get the
    /// public services of the group they name, and nothing without a name.
    pub async fn list_services(
        &self,
        caller: Caller,
        group_name: Option<&str>,
    ) -> AppResult<Vec<Service>> {
        let mut services = if caller.is_authenticated() {
            self.services.list(None, 0).await?
        } else {
            let Some(name) = group_name.filter(|n| !n.is_empty()) else {
                return Ok(Vec::new());
            };
            let group = match self.groups.find_by_name(name).await {
                Ok(group) => group,
                Err(AppError::NotFound { .. }) => {
                    log::warn!("Failed to find group {}", name);
                    return Ok(Vec::new());
                }
                Err(e) => return Err(e),
            };
            let in_group = self.services.list_in_group(group.id).await?;
            select_visible(in_group, |s| s.is_public())
        };

        sort_by_order(&mut services);
        Ok(services)
    }

    /// One service, checked against group membership and its public flag
    pub async fn get_service(
        &self,
        id: i64,
        caller: Caller,
        group_name: Option<&str>,
    ) -> AppResult<Service> {
        let service = self.services.find(id).await?;

        let group = match group_name {
            Some(name) if !caller.is_authenticated() => {
                match self.groups.find_by_name(name).await {
                    Ok(group) => Some(group),
                    Err(AppError::NotFound { .. }) => None,
                    Err(e) => return Err(e),
                }
            }
            _ => None,
        };
        let credential = group_name.map(|name| GroupCredential {
            name,
            group: group.as_ref(),
        });

        if !can_read_service(caller, &service, credential.as_ref()) {
            return Err(AppError::NotAuthenticated(format!(
                "service {} is not visible to this caller",
                service.id
            )));
        }
        Ok(service)
    }

    pub async fn create_service(&self, input: CreateService) -> AppResult<Service> {
        self.services.create(input).await
    }

    pub async fn update_service(&self, id: i64, update: UpdateService) -> AppResult<Service> {
        let mut service = self.services.find(id).await?;
        service.apply(update);
        self.services.update(&service).await
    }

    pub async fn patch_service(&self, id: i64, patch: PatchServiceStatus) -> AppResult<Service> {
        let service = self.services.find(id).await?;
        self.services.patch_status(service, patch).await
    }

    pub async fn delete_service(&self, id: i64) -> AppResult<Service> {
        let service = self.services.find(id).await?;
        self.services.delete(&service).await?;
        Ok(service)
    }

    pub async fn reorder_services(
        &self,
        changes: Vec<OrderChange>,
    ) -> AppResult<Vec<OrderChange>> {
        apply_order(&self.services, changes).await
    }

    pub async fn delete_hits(&self, id: i64) -> AppResult<u64> {
        let service = self.services.find(id).await?;
        self.services.delete_hits(&service).await
    }

    pub async fn delete_failures(&self, id: i64) -> AppResult<u64> {
        let service = self.services.find(id).await?;
        self.services.delete_failures(&service).await
    }

    // =========================================================================
    // Observations
    // =========================================================================

    /// Builds a window from optional unix-second bounds. Missing bounds default
    /// to the configured window ending now.
    pub fn window(&self, start: Option<i64>, end: Option<i64>) -> AppResult<Window> {
        let end = match end {
            Some(secs) => timestamp(secs)?,
            None => Utc::now(),
        };
        let start = match start {
            Some(secs) => timestamp(secs)?,
            None => Window::ending_at(end, self.graph.default_window)?.start,
        };
        Window::new(start, end)
    }

    /// Requested bucket count, or the configured default
    pub fn bucket_count(&self, requested: Option<usize>) -> AppResult<usize> {
        let count = requested.unwrap_or(self.graph.default_buckets);
        if count == 0 || count > self.graph.max_buckets {
            return Err(AppError::Validation(format!(
                "buckets must be between 1 and {}",
                self.graph.max_buckets
            )));
        }
        Ok(count)
    }

    pub async fn list_hits(&self, service: &Service, window: &Window) -> AppResult<Vec<Hit>> {
        self.services.hits(service, window).await
    }

    pub async fn list_failures(
        &self,
        service: &Service,
        window: &Window,
    ) -> AppResult<Vec<Failure>> {
        self.services.failures(service, window).await
    }

    /// Bucketed chart series for an already authorized service
    pub async fn graph_data(
        &self,
        service: &Service,
        metric: GraphMetric,
        window: Window,
        bucket_count: usize,
        cancel: CancellationToken,
    ) -> AppResult<Vec<BucketPoint>> {
        let samples: Vec<Sample> = match metric {
            GraphMetric::Latency => self
                .services
                .hits(service, &window)
                .await?
                .iter()
                .map(|h| Sample::new(h.created_at, micros_to_millis(h.latency)))
                .collect(),
            GraphMetric::Ping => self
                .services
                .hits(service, &window)
                .await?
                .iter()
                .map(|h| Sample::new(h.created_at, micros_to_millis(h.ping_time)))
                .collect(),
            GraphMetric::Failures => self
                .services
                .failures(service, &window)
                .await?
                .iter()
                .map(|f| Sample::new(f.created_at, 1.0))
                .collect(),
        };

        let aggregation = metric.aggregation();
        tokio::task::spawn_blocking(move || {
            aggregation::bucket(&samples, &window, aggregation, bucket_count, &cancel)
        })
        .await
        .map_err(|e| AppError::Internal(format!("aggregation task failed: {}", e)))?
    }

    /// Uptime summary for an already authorized service
    pub async fn uptime(
        &self,
        service: &Service,
        window: Window,
        cancel: CancellationToken,
    ) -> AppResult<UptimeSummary> {
        let hits = self.services.hits(service, &window).await?;
        let failures = self.services.failures(service, &window).await?;

        tokio::task::spawn_blocking(move || {
            aggregation::uptime(&hits, &failures, &window, &cancel)
        })
        .await
        .map_err(|e| AppError::Internal(format!("aggregation task failed: {}", e)))?
    }
}

fn timestamp(secs: i64) -> AppResult<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| AppError::Validation(format!("invalid timestamp {}", secs)))
}
