use serde::Deserialize;

/// Query parameters for listing groups (offset-based, zero-indexed pages)
#[derive(Debug, Default, Deserialize)]
pub struct ListGroupsQuery {
    /// Page number (default: 0)
    #[serde(default)]
    pub page: i64,

    /// Ask for every group regardless of its public flag (authenticated callers only)
    #[serde(default)]
    pub all: bool,
}

/// Group name credential presented by anonymous callers
#[derive(Debug, Default, Deserialize)]
pub struct GroupNameQuery {
    pub group_name: Option<String>,
}

/// Time range and resolution of an observation query
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    /// Unix seconds, inclusive
    pub start: Option<i64>,
    /// Unix seconds, inclusive
    pub end: Option<i64>,
    /// Number of buckets for chart series
    pub buckets: Option<usize>,
    pub group_name: Option<String>,
}

impl GroupNameQuery {
    pub fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }
}

impl WindowQuery {
    pub fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }
}
