use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::Store;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateGroup, CreateService, Failure, Group, Hit, NewFailure, NewHit, Service,
};

const GROUP_COLUMNS: &str = "id, name, public, order_id, created_at, updated_at";
const SERVICE_COLUMNS: &str = "id, name, domain, group_id, public, online, order_id, \
     latency, ping_time, last_issue, created_at, updated_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps the unique-name constraint to a conflict, leaves everything else untouched
fn group_write_error(e: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.constraint() == Some("groups_name_key") {
            return AppError::Conflict(format!("Group with name '{}' already exists", name));
        }
    }
    AppError::Storage(e)
}

#[async_trait]
impl Store for PgStore {
    async fn group_by_id(&self, id: i64) -> AppResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn group_by_name(&self, name: &str) -> AppResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn groups(&self, limit: Option<i64>, offset: i64) -> AppResult<Vec<Group>> {
        // LIMIT NULL is LIMIT ALL in PostgreSQL
        let groups = sqlx::query_as::<_, Group>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn insert_group(&self, input: &CreateGroup) -> AppResult<Group> {
        sqlx::query_as::<_, Group>(&format!(
            r#"
            INSERT INTO groups (name, public, order_id)
            VALUES ($1, $2, $3)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(input.public)
        .bind(input.order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| group_write_error(e, &input.name))
    }

    async fn save_group(&self, group: &Group) -> AppResult<Group> {
        sqlx::query_as::<_, Group>(&format!(
            r#"
            UPDATE groups SET name = $1, public = $2, order_id = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(&group.name)
        .bind(group.public)
        .bind(group.order)
        .bind(group.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| group_write_error(e, &group.name))?
        .ok_or_else(|| AppError::not_found("group", group.id))
    }

    async fn remove_group(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn service_by_id(&self, id: i64) -> AppResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    async fn service_by_name(&self, name: &str) -> AppResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE name = $1 ORDER BY id ASC LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    async fn services(&self, limit: Option<i64>, offset: i64) -> AppResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    async fn services_in_group(&self, group_id: i64) -> AppResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE group_id = $1 ORDER BY id ASC"
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    async fn insert_service(&self, input: &CreateService) -> AppResult<Service> {
        let service = sqlx::query_as::<_, Service>(&format!(
            r#"
            INSERT INTO services (name, domain, group_id, public, order_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.domain)
        .bind(input.group_id.filter(|id| *id > 0))
        .bind(input.public)
        .bind(input.order)
        .fetch_one(&self.pool)
        .await?;

        Ok(service)
    }

    async fn save_service(&self, service: &Service) -> AppResult<Service> {
        sqlx::query_as::<_, Service>(&format!(
            r#"
            UPDATE services
            SET name = $1, domain = $2, group_id = $3, public = $4, online = $5,
                order_id = $6, latency = $7, ping_time = $8, last_issue = $9,
                updated_at = NOW()
            WHERE id = $10
            RETURNING {SERVICE_COLUMNS}
            "#
        ))
        .bind(&service.name)
        .bind(&service.domain)
        .bind(service.group())
        .bind(service.public)
        .bind(service.online)
        .bind(service.order)
        .bind(service.latency)
        .bind(service.ping_time)
        .bind(&service.last_issue)
        .bind(service.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("service", service.id))
    }

    async fn remove_service(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_hit(&self, hit: &NewHit) -> AppResult<Hit> {
        let hit = sqlx::query_as::<_, Hit>(
            r#"
            INSERT INTO hits (service_id, latency, ping_time, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, service_id, latency, ping_time, created_at
            "#,
        )
        .bind(hit.service_id)
        .bind(hit.latency)
        .bind(hit.ping_time)
        .bind(hit.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(hit)
    }

    async fn hits_between(
        &self,
        service_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Hit>> {
        let hits = sqlx::query_as::<_, Hit>(
            r#"
            SELECT id, service_id, latency, ping_time, created_at
            FROM hits
            WHERE service_id = $1 AND created_at >= $2 AND created_at <= $3
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(service_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(hits)
    }

    async fn remove_hits(&self, service_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM hits WHERE service_id = $1")
            .bind(service_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_failure(&self, failure: &NewFailure) -> AppResult<Failure> {
        let failure = sqlx::query_as::<_, Failure>(
            r#"
            INSERT INTO failures (service_id, issue, kind, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, service_id, issue, kind, created_at
            "#,
        )
        .bind(failure.service_id)
        .bind(&failure.issue)
        .bind(failure.kind)
        .bind(failure.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(failure)
    }

    async fn failures_between(
        &self,
        service_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Failure>> {
        let failures = sqlx::query_as::<_, Failure>(
            r#"
            SELECT id, service_id, issue, kind, created_at
            FROM failures
            WHERE service_id = $1 AND created_at >= $2 AND created_at <= $3
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(service_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(failures)
    }

    async fn remove_failures(&self, service_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM failures WHERE service_id = $1")
            .bind(service_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
