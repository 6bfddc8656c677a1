//! Per-role capability override.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::models::user::Role;

/// Replaces the default capability column for `role` while it exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissions {
    pub role: Role,
    pub capabilities: BTreeMap<Capability, bool>,
    pub updated_at: DateTime<Utc>,
}
