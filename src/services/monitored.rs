use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::metrics::{EntityKind, QueryMetrics, QueryOp};
use crate::models::{
    CreateService, Failure, FailureKind, Hit, NewFailure, NewHit, PatchServiceStatus, Service,
};
use crate::services::aggregation::Window;
use crate::services::groups::validate_name;
use crate::services::ordering::Reorderable;

/// Issue recorded when a service is forced offline without an explanation
pub const DEFAULT_TRIGGER_ISSUE: &str = "Service was triggered to be offline";

/// Entity store for services, plus access to their hits and failures
#[derive(Clone)]
pub struct ServiceStore {
    store: Arc<dyn Store>,
    metrics: Arc<QueryMetrics>,
}

impl ServiceStore {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<QueryMetrics>) -> Self {
        Self { store, metrics }
    }

    pub async fn find(&self, id: i64) -> AppResult<Service> {
        let service = self
            .store
            .service_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("service", id))?;
        self.metrics.record(EntityKind::Service, QueryOp::Find);
        Ok(service)
    }

    pub async fn find_by_name(&self, name: &str) -> AppResult<Service> {
        let service = self
            .store
            .service_by_name(name)
            .await?
            .ok_or_else(|| AppError::not_found("service", name))?;
        self.metrics.record(EntityKind::Service, QueryOp::Find);
        Ok(service)
    }

    pub async fn list(&self, limit: Option<i64>, offset: i64) -> AppResult<Vec<Service>> {
        let services = self.store.services(limit, offset).await?;
        self.metrics.record(EntityKind::Service, QueryOp::Find);
        Ok(services)
    }

    pub async fn list_in_group(&self, group_id: i64) -> AppResult<Vec<Service>> {
        let services = self.store.services_in_group(group_id).await?;
        self.metrics.record(EntityKind::Service, QueryOp::Find);
        Ok(services)
    }

    pub async fn create(&self, mut input: CreateService) -> AppResult<Service> {
        input.name = validate_name("service", &input.name)?;

        let service = self.store.insert_service(&input).await?;
        self.metrics.record(EntityKind::Service, QueryOp::Create);
        Ok(service)
    }

    pub async fn update(&self, service: &Service) -> AppResult<Service> {
        let name = validate_name("service", &service.name)?;
        let service = Service {
            name,
            ..service.clone()
        };

        let service = self.store.save_service(&service).await?;
        self.metrics.record(EntityKind::Service, QueryOp::Update);
        Ok(service)
    }

    pub async fn delete(&self, service: &Service) -> AppResult<()> {
        if !self.store.remove_service(service.id).await? {
            return Err(AppError::not_found("service", service.id));
        }
        self.metrics.record(EntityKind::Service, QueryOp::Delete);
        Ok(())
    }

    /// Applies an online/offline override and records the matching observation
    pub async fn patch_status(
        &self,
        mut service: Service,
        patch: PatchServiceStatus,
    ) -> AppResult<Service> {
        service.online = patch.online;
        service.latency = patch.latency;

        if patch.online {
            self.record_hit(&service).await?;
        } else {
            let issue = patch
                .issue
                .filter(|i| !i.is_empty())
                .unwrap_or_else(|| DEFAULT_TRIGGER_ISSUE.to_string());
            self.record_failure(&service, &issue, FailureKind::Trigger)
                .await?;
            service.last_issue = Some(issue);
        }

        self.update(&service).await
    }

    /// Records a successful check using the service's current measurements
    pub async fn record_hit(&self, service: &Service) -> AppResult<Hit> {
        self.store
            .insert_hit(&NewHit {
                service_id: service.id,
                latency: service.latency,
                ping_time: service.ping_time,
                created_at: Utc::now(),
            })
            .await
    }

    pub async fn record_failure(
        &self,
        service: &Service,
        issue: &str,
        kind: FailureKind,
    ) -> AppResult<Failure> {
        log::info!(
            "Service {} ({}) failed: {} [{}]",
            service.name,
            service.id,
            issue,
            kind
        );
        self.store
            .insert_failure(&NewFailure {
                service_id: service.id,
                issue: issue.to_string(),
                kind,
                created_at: Utc::now(),
            })
            .await
    }

    pub async fn hits(&self, service: &Service, window: &Window) -> AppResult<Vec<Hit>> {
        self.store
            .hits_between(service.id, window.start, window.end)
            .await
    }

    pub async fn failures(&self, service: &Service, window: &Window) -> AppResult<Vec<Failure>> {
        self.store
            .failures_between(service.id, window.start, window.end)
            .await
    }

    pub async fn delete_hits(&self, service: &Service) -> AppResult<u64> {
        let removed = self.store.remove_hits(service.id).await?;
        log::info!("Deleted {} hit(s) of service {}", removed, service.id);
        Ok(removed)
    }

    pub async fn delete_failures(&self, service: &Service) -> AppResult<u64> {
        let removed = self.store.remove_failures(service.id).await?;
        log::info!("Deleted {} failure(s) of service {}", removed, service.id);
        Ok(removed)
    }
}

#[async_trait]
impl Reorderable for ServiceStore {
    async fn set_order(&self, id: i64, order: i32) -> AppResult<()> {
        let mut service = self.find(id).await?;
        service.order = order;
        self.update(&service).await?;
        Ok(())
    }
}
