use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A monitored endpoint
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub domain: String,
    pub group_id: Option<i64>,
    /// Unset means private
    pub public: Option<bool>,
    pub online: bool,
    #[sqlx(rename = "order_id")]
    #[serde(rename = "order_id")]
    pub order: i32,
    /// Last measured latency in microseconds
    pub latency: i64,
    /// Last measured ping time in microseconds
    pub ping_time: i64,
    pub last_issue: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateService {
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default, rename = "order_id")]
    pub order: i32,
}

/// DTO for updating a service; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateService {
    pub name: Option<String>,
    pub domain: Option<String>,
    /// `Some(0)` moves the service out of its group
    pub group_id: Option<i64>,
    pub public: Option<bool>,
    #[serde(rename = "order_id")]
    pub order: Option<i32>,
}

/// Status override pushed by an operator or an external checker
#[derive(Debug, Clone, Deserialize)]
pub struct PatchServiceStatus {
    pub online: bool,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub latency: i64,
}

impl Service {
    pub fn is_public(&self) -> bool {
        self.public == Some(true)
    }

    /// Owning group id; zero and absent both mean ungrouped
    pub fn group(&self) -> Option<i64> {
        self.group_id.filter(|id| *id > 0)
    }

    /// Applies the present fields of an update
    pub fn apply(&mut self, update: UpdateService) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(domain) = update.domain {
            self.domain = domain;
        }
        if let Some(group_id) = update.group_id {
            self.group_id = Some(group_id).filter(|id| *id > 0);
        }
        if update.public.is_some() {
            self.public = update.public;
        }
        if let Some(order) = update.order {
            self.order = order;
        }
    }
}
