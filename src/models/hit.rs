use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Successful check against a service. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Hit {
    pub id: i64,
    pub service_id: i64,
    /// Microseconds
    pub latency: i64,
    /// Microseconds
    pub ping_time: i64,
    pub created_at: DateTime<Utc>,
}

/// DTO for recording a hit
#[derive(Debug, Clone, Deserialize)]
pub struct NewHit {
    pub service_id: i64,
    pub latency: i64,
    pub ping_time: i64,
    pub created_at: DateTime<Utc>,
}
