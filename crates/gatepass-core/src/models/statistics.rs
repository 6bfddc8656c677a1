//! Dashboard aggregates.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_permits: u64,
    pub open_permits: u64,
    pub closed_permits: u64,
    pub total_users: u64,
    pub permits_by_region: Vec<NamedCount>,
    pub permits_by_type: Vec<NamedCount>,
    /// One entry per day (`YYYY-MM-DD`) over the trailing 30 days, oldest
    /// first, zero-filled.
    pub daily_trend: Vec<NamedCount>,
    pub top_carriers: Vec<NamedCount>,
    pub top_closers: Vec<NamedCount>,
    pub top_creators: Vec<NamedCount>,
}
