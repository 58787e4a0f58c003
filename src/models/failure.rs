use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Origin of a failure record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Observed by a real check
    Organic,
    /// Forced through the status patch endpoint
    Trigger,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Organic => write!(f, "organic"),
            FailureKind::Trigger => write!(f, "trigger"),
        }
    }
}

/// Failed check against a service. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Failure {
    pub id: i64,
    pub service_id: i64,
    pub issue: String,
    pub kind: FailureKind,
    pub created_at: DateTime<Utc>,
}

/// DTO for recording a failure
#[derive(Debug, Clone, Deserialize)]
pub struct NewFailure {
    pub service_id: i64,
    pub issue: String,
    pub kind: FailureKind,
    pub created_at: DateTime<Utc>,
}
