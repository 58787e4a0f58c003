pub mod failure;
pub mod group;
pub mod hit;
pub mod service;

pub use failure::{Failure, FailureKind, NewFailure};
pub use group::{CreateGroup, Group, UpdateGroup};
pub use hit::{Hit, NewHit};
pub use service::{CreateService, PatchServiceStatus, Service, UpdateService};
