pub mod aggregation;
pub mod catalog;
pub mod groups;
pub mod monitored;
pub mod ordering;
pub mod visibility;

pub use aggregation::{Aggregation, BucketPoint, Sample, UptimePeriod, UptimeSummary, Window};
pub use catalog::{Catalog, GraphMetric};
pub use groups::GroupStore;
pub use monitored::ServiceStore;
pub use ordering::{apply_order, sort_by_order, OrderChange};
pub use visibility::{can_read, can_read_service, select_visible, Caller, GroupCredential};
