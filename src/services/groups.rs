use async_trait::async_trait;
use std::sync::Arc;

use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::metrics::{EntityKind, QueryMetrics, QueryOp};
use crate::models::{CreateGroup, Group};
use crate::services::ordering::Reorderable;

/// Maximum length of group and service names
pub const MAX_NAME_LEN: usize = 255;

/// Validates an entity name, returning the trimmed value
pub fn validate_name(kind: &str, name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(format!("{} name is empty", kind)));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "{} name cannot exceed {} characters",
            kind, MAX_NAME_LEN
        )));
    }
    Ok(name.to_string())
}

/// Entity store for groups: validation before writes, query metrics after
/// every successful call.
#[derive(Clone)]
pub struct GroupStore {
    store: Arc<dyn Store>,
    metrics: Arc<QueryMetrics>,
}

impl GroupStore {
    pub fn new(store: Arc<dyn Store>, metrics: Arc<QueryMetrics>) -> Self {
        Self { store, metrics }
    }

    pub async fn find(&self, id: i64) -> AppResult<Group> {
        let group = self
            .store
            .group_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("group", id))?;
        self.metrics.record(EntityKind::Group, QueryOp::Find);
        Ok(group)
    }

    pub async fn find_by_name(&self, name: &str) -> AppResult<Group> {
        let group = self
            .store
            .group_by_name(name)
            .await?
            .ok_or_else(|| AppError::not_found("group", name))?;
        self.metrics.record(EntityKind::Group, QueryOp::Find);
        Ok(group)
    }

    /// Lists groups in identity order; `limit = None` returns everything
    pub async fn list(&self, limit: Option<i64>, offset: i64) -> AppResult<Vec<Group>> {
        let groups = self.store.groups(limit, offset).await?;
        self.metrics.record(EntityKind::Group, QueryOp::Find);
        Ok(groups)
    }

    pub async fn create(&self, mut input: CreateGroup) -> AppResult<Group> {
        input.name = validate_name("group", &input.name)?;

        let group = self.store.insert_group(&input).await?;
        self.metrics.record(EntityKind::Group, QueryOp::Create);
        Ok(group)
    }

    pub async fn update(&self, group: &Group) -> AppResult<Group> {
        let name = validate_name("group", &group.name)?;
        let group = Group {
            name,
            ..group.clone()
        };

        let group = self.store.save_group(&group).await?;
        self.metrics.record(EntityKind::Group, QueryOp::Update);
        Ok(group)
    }

    /// Deletes a group. Services referencing it are left in place.
    pub async fn delete(&self, group: &Group) -> AppResult<()> {
        if !self.store.remove_group(group.id).await? {
            return Err(AppError::not_found("group", group.id));
        }
        self.metrics.record(EntityKind::Group, QueryOp::Delete);
        Ok(())
    }
}

#[async_trait]
impl Reorderable for GroupStore {
    async fn set_order(&self, id: i64, order: i32) -> AppResult<()> {
        let mut group = self.find(id).await?;
        group.order = order;
        self.update(&group).await?;
        Ok(())
    }
}
