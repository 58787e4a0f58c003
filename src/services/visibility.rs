//! Read-permission rules for groups and services.

use serde::Serialize;

use crate::models::{Group, Service};

/// Authentication class of the party making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Caller {
    Anonymous,
    Reader,
    Admin,
}

impl Caller {
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Caller::Anonymous)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Caller::Admin)
    }
}

/// Entities with a tri-state public flag
pub trait Visible {
    /// `None` when the flag was never set
    fn public(&self) -> Option<bool>;
}

impl Visible for Group {
    fn public(&self) -> Option<bool> {
        self.public
    }
}

impl Visible for Service {
    fn public(&self) -> Option<bool> {
        self.public
    }
}

/// Single-entity read permission. Unset public flags count as private.
pub fn can_read<T: Visible>(caller: Caller, entity: &T) -> bool {
    caller.is_admin() || entity.public() == Some(true)
}

/// Listing permission for groups. `include_all` widens an authenticated
/// caller's listing to every group; it never applies to single fetches.
pub fn can_list_group(caller: Caller, group: &Group, include_all: bool) -> bool {
    (include_all && caller.is_authenticated()) || can_read(caller, group)
}

/// Group name presented by an anonymous caller, with the group it resolved to
#[derive(Debug, Clone, Copy)]
pub struct GroupCredential<'a> {
    pub name: &'a str,
    pub group: Option<&'a Group>,
}

impl GroupCredential<'_> {
    /// True when the name resolved to exactly the service's owning group
    pub fn matches(&self, service: &Service) -> bool {
        match self.group {
            Some(group) => group.name == self.name && service.group() == Some(group.id),
            None => false,
        }
    }
}

/// Authenticated callers are members of every group; anonymous callers only
/// of the group whose name they present.
pub fn is_member(caller: Caller, service: &Service, credential: Option<&GroupCredential<'_>>) -> bool {
    caller.is_authenticated() || credential.is_some_and(|c| c.matches(service))
}

/// Read permission for one service: group membership and the service's own flag
pub fn can_read_service(
    caller: Caller,
    service: &Service,
    credential: Option<&GroupCredential<'_>>,
) -> bool {
    is_member(caller, service, credential) && can_read(caller, service)
}

/// Keeps the readable items, preserving input order
pub fn select_visible<T, F>(items: Vec<T>, mut readable: F) -> Vec<T>
where
    F: FnMut(&T) -> bool,
{
    items.into_iter().filter(|item| readable(item)).collect()
}
