//! Query counters for the entity store.
//!
//! Recording is a side effect only: nothing in the core reads these values to
//! make a decision.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Entity kinds tracked by the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Group,
    Service,
}

/// Store operations tracked by the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOp {
    Find,
    Create,
    Update,
    Delete,
}

impl EntityKind {
    const ALL: [EntityKind; 2] = [EntityKind::Group, EntityKind::Service];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Group => "group",
            EntityKind::Service => "service",
        }
    }
}

impl QueryOp {
    const ALL: [QueryOp; 4] = [QueryOp::Find, QueryOp::Create, QueryOp::Update, QueryOp::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOp::Find => "find",
            QueryOp::Create => "create",
            QueryOp::Update => "update",
            QueryOp::Delete => "delete",
        }
    }
}

/// Per (entity, operation) query counters
#[derive(Debug, Default)]
pub struct QueryMetrics {
    counters: [[AtomicU64; 4]; 2],
}

impl QueryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one successful store operation
    pub fn record(&self, kind: EntityKind, op: QueryOp) {
        self.counters[kind as usize][op as usize].fetch_add(1, Ordering::Relaxed);
        log::debug!("query {} {}", kind.as_str(), op.as_str());
    }

    pub fn count(&self, kind: EntityKind, op: QueryOp) -> u64 {
        self.counters[kind as usize][op as usize].load(Ordering::Relaxed)
    }

    /// Point-in-time copy, keyed `"<kind>.<op>"`
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        let mut snapshot = BTreeMap::new();
        for kind in EntityKind::ALL {
            for op in QueryOp::ALL {
                snapshot.insert(
                    format!("{}.{}", kind.as_str(), op.as_str()),
                    self.count(kind, op),
                );
            }
        }
        snapshot
    }
}
