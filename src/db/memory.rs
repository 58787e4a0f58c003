//! In-memory store, used by the test-suite and when no DATABASE_URL is set.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::Store;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateGroup, CreateService, Failure, Group, Hit, NewFailure, NewHit, Service,
};

#[derive(Debug, Default)]
struct Tables {
    groups: BTreeMap<i64, Group>,
    services: BTreeMap<i64, Service>,
    hits: Vec<Hit>,
    failures: Vec<Failure>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.groups
            .values()
            .any(|g| g.name == name && Some(g.id) != except)
    }
}

/// Thread-safe in-memory store. Ids are allocated from one shared sequence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T: Clone>(rows: impl Iterator<Item = T>, limit: Option<i64>, offset: i64) -> Vec<T> {
    let rows = rows.skip(offset.max(0) as usize);
    match limit {
        Some(limit) => rows.take(limit.max(0) as usize).collect(),
        None => rows.collect(),
    }
}

fn in_window(at: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start <= at && at <= end
}

#[async_trait]
impl Store for MemoryStore {
    async fn group_by_id(&self, id: i64) -> AppResult<Option<Group>> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn group_by_name(&self, name: &str) -> AppResult<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.name == name).cloned())
    }

    async fn groups(&self, limit: Option<i64>, offset: i64) -> AppResult<Vec<Group>> {
        let tables = self.tables.read().await;
        Ok(page(tables.groups.values().cloned(), limit, offset))
    }

    async fn insert_group(&self, input: &CreateGroup) -> AppResult<Group> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(&input.name, None) {
            return Err(AppError::Conflict(format!(
                "Group with name '{}' already exists",
                input.name
            )));
        }

        let now = Utc::now();
        let group = Group {
            id: tables.next_id(),
            name: input.name.clone(),
            public: input.public,
            order: input.order,
            created_at: now,
            updated_at: now,
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn save_group(&self, group: &Group) -> AppResult<Group> {
        let mut tables = self.tables.write().await;
        if tables.name_taken(&group.name, Some(group.id)) {
            return Err(AppError::Conflict(format!(
                "Group with name '{}' already exists",
                group.name
            )));
        }

        let stored = tables
            .groups
            .get_mut(&group.id)
            .ok_or_else(|| AppError::not_found("group", group.id))?;
        *stored = Group {
            updated_at: Utc::now(),
            ..group.clone()
        };
        Ok(stored.clone())
    }

    async fn remove_group(&self, id: i64) -> AppResult<bool> {
        Ok(self.tables.write().await.groups.remove(&id).is_some())
    }

    async fn service_by_id(&self, id: i64) -> AppResult<Option<Service>> {
        Ok(self.tables.read().await.services.get(&id).cloned())
    }

    async fn service_by_name(&self, name: &str) -> AppResult<Option<Service>> {
        let tables = self.tables.read().await;
        Ok(tables.services.values().find(|s| s.name == name).cloned())
    }

    async fn services(&self, limit: Option<i64>, offset: i64) -> AppResult<Vec<Service>> {
        let tables = self.tables.read().await;
        Ok(page(tables.services.values().cloned(), limit, offset))
    }

    async fn services_in_group(&self, group_id: i64) -> AppResult<Vec<Service>> {
        let tables = self.tables.read().await;
        Ok(tables
            .services
            .values()
            .filter(|s| s.group() == Some(group_id))
            .cloned()
            .collect())
    }

    async fn insert_service(&self, input: &CreateService) -> AppResult<Service> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let service = Service {
            id: tables.next_id(),
            name: input.name.clone(),
            domain: input.domain.clone(),
            group_id: input.group_id.filter(|id| *id > 0),
            public: input.public,
            online: false,
            order: input.order,
            latency: 0,
            ping_time: 0,
            last_issue: None,
            created_at: now,
            updated_at: now,
        };
        tables.services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn save_service(&self, service: &Service) -> AppResult<Service> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .services
            .get_mut(&service.id)
            .ok_or_else(|| AppError::not_found("service", service.id))?;
        *stored = Service {
            group_id: service.group(),
            updated_at: Utc::now(),
            ..service.clone()
        };
        Ok(stored.clone())
    }

    async fn remove_service(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.services.remove(&id).is_some();
        if removed {
            tables.hits.retain(|h| h.service_id != id);
            tables.failures.retain(|f| f.service_id != id);
        }
        Ok(removed)
    }

    async fn insert_hit(&self, hit: &NewHit) -> AppResult<Hit> {
        let mut tables = self.tables.write().await;
        let hit = Hit {
            id: tables.next_id(),
            service_id: hit.service_id,
            latency: hit.latency,
            ping_time: hit.ping_time,
            created_at: hit.created_at,
        };
        tables.hits.push(hit.clone());
        Ok(hit)
    }

    async fn hits_between(
        &self,
        service_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Hit>> {
        let tables = self.tables.read().await;
        Ok(tables
            .hits
            .iter()
            .filter(|h| h.service_id == service_id && in_window(h.created_at, start, end))
            .cloned()
            .collect())
    }

    async fn remove_hits(&self, service_id: i64) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.hits.len();
        tables.hits.retain(|h| h.service_id != service_id);
        Ok((before - tables.hits.len()) as u64)
    }

    async fn insert_failure(&self, failure: &NewFailure) -> AppResult<Failure> {
        let mut tables = self.tables.write().await;
        let failure = Failure {
            id: tables.next_id(),
            service_id: failure.service_id,
            issue: failure.issue.clone(),
            kind: failure.kind,
            created_at: failure.created_at,
        };
        tables.failures.push(failure.clone());
        Ok(failure)
    }

    async fn failures_between(
        &self,
        service_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Failure>> {
        let tables = self.tables.read().await;
        Ok(tables
            .failures
            .iter()
            .filter(|f| f.service_id == service_id && in_window(f.created_at, start, end))
            .cloned()
            .collect())
    }

    async fn remove_failures(&self, service_id: i64) -> AppResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.failures.len();
        tables.failures.retain(|f| f.service_id != service_id);
        Ok((before - tables.failures.len()) as u64)
    }

    async fn ping(&self) -> bool {
        true
    }
}
