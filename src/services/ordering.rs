//! User-controlled display order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{Group, Service};

/// One item of a reorder batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChange {
    #[serde(alias = "group", alias = "service")]
    pub id: i64,
    pub order: i32,
}

/// Entities carrying a caller-assigned order value
pub trait Ordered {
    fn order(&self) -> i32;
}

impl Ordered for Group {
    fn order(&self) -> i32 {
        self.order
    }
}

impl Ordered for Service {
    fn order(&self) -> i32 {
        self.order
    }
}

/// Stores whose entities can be re-sequenced one id at a time
#[async_trait]
pub trait Reorderable: Send + Sync {
    /// Looks the entity up and saves it with the new order
    async fn set_order(&self, id: i64, order: i32) -> AppResult<()>;
}

/// Sorts by order value. The sort is stable, so ties keep their input position.
pub fn sort_by_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(|item| item.order());
}

/// Applies a reorder batch item by item.
///
/// Processing stops at the first failing item. Items before it stay applied;
/// the error reports the failing id and how many items were applied.
pub async fn apply_order<R>(target: &R, changes: Vec<OrderChange>) -> AppResult<Vec<OrderChange>>
where
    R: Reorderable + ?Sized,
{
    for (applied, change) in changes.iter().enumerate() {
        if let Err(e) = target.set_order(change.id, change.order).await {
            log::warn!(
                "Reorder stopped at id {} ({} of {} applied): {}",
                change.id,
                applied,
                changes.len(),
                e
            );
            return Err(AppError::Reorder {
                failed_id: change.id,
                applied,
                source: Box::new(e),
            });
        }
    }

    Ok(changes)
}
