use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Logical grouping of monitored services
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub name: String,
    /// Unset means private
    pub public: Option<bool>,
    #[sqlx(rename = "order_id")]
    #[serde(rename = "order_id")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for creating a new group
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default, rename = "order_id")]
    pub order: i32,
}

/// DTO for updating a group; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub public: Option<bool>,
    #[serde(rename = "order_id")]
    pub order: Option<i32>,
}

impl Group {
    /// Applies the present fields of an update
    pub fn apply(&mut self, update: UpdateGroup) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if update.public.is_some() {
            self.public = update.public;
        }
        if let Some(order) = update.order {
            self.order = order;
        }
    }
}
