//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Lifecycle transitions on permits
//! are conditional writes: they return `Ok(None)` when the row is missing
//! or no longer in the expected state, leaving classification to the
//! caller.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::capability::Capability;
use crate::error::GatepassResult;
use crate::lifecycle::RegionScope;
use crate::models::{
    activity::{ActivityLogEntry, CreateActivityLogEntry},
    permit::{ClosePermit, CreatePermit, Permit, UpdatePermit},
    role_permissions::RolePermissions,
    user::{CreateUser, Role, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: u64 = 100;
    pub const MAX_LIMIT: u64 = 500;

    /// Apply defaults and clamp `limit` to [`Self::MAX_LIMIT`].
    pub fn clamped(offset: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = GatepassResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GatepassResult<User>> + Send;
    fn get_by_username(&self, username: &str)
    -> impl Future<Output = GatepassResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = GatepassResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = GatepassResult<User>> + Send;
    /// Hard delete. Permits and activity entries keep their references.
    fn delete(&self, id: Uuid) -> impl Future<Output = GatepassResult<()>> + Send;
    /// Newest first.
    fn list(&self) -> impl Future<Output = GatepassResult<Vec<User>>> + Send;
    fn count(&self) -> impl Future<Output = GatepassResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Permits
// ---------------------------------------------------------------------------

/// Filters for listing permits. All present filters must match.
#[derive(Debug, Clone)]
pub struct PermitFilter {
    pub scope: RegionScope,
    pub region: Option<String>,
    pub date: Option<NaiveDate>,
    /// Case-insensitive substring over permit number, carrier name,
    /// carrier id and location.
    pub search: Option<String>,
}

impl Default for PermitFilter {
    fn default() -> Self {
        Self {
            scope: RegionScope::All,
            region: None,
            date: None,
            search: None,
        }
    }
}

pub trait PermitRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the permit number is taken.
    fn create(&self, input: CreatePermit) -> impl Future<Output = GatepassResult<Permit>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = GatepassResult<Permit>> + Send;
    fn get_by_number(
        &self,
        permit_number: &str,
    ) -> impl Future<Output = GatepassResult<Option<Permit>>> + Send;
    /// Apply `input` only while the permit is open.
    fn update_open(
        &self,
        id: Uuid,
        input: UpdatePermit,
    ) -> impl Future<Output = GatepassResult<Option<Permit>>> + Send;
    /// Close only while the permit is open.
    fn close(
        &self,
        id: Uuid,
        input: ClosePermit,
    ) -> impl Future<Output = GatepassResult<Option<Permit>>> + Send;
    /// Reopen only while the permit is closed.
    fn reopen(&self, id: Uuid) -> impl Future<Output = GatepassResult<Option<Permit>>> + Send;
    /// Returns the deleted permit, or `None` if it was already gone.
    fn delete(&self, id: Uuid) -> impl Future<Output = GatepassResult<Option<Permit>>> + Send;
    /// Newest first.
    fn list(
        &self,
        filter: PermitFilter,
    ) -> impl Future<Output = GatepassResult<Vec<Permit>>> + Send;
}

// ---------------------------------------------------------------------------
// Role permission overrides
// ---------------------------------------------------------------------------

pub trait RolePermissionRepository: Send + Sync {
    fn get(&self, role: Role)
    -> impl Future<Output = GatepassResult<Option<RolePermissions>>> + Send;
    fn list(&self) -> impl Future<Output = GatepassResult<Vec<RolePermissions>>> + Send;
    /// Insert or replace the override for `role`.
    fn upsert(
        &self,
        role: Role,
        capabilities: BTreeMap<Capability, bool>,
    ) -> impl Future<Output = GatepassResult<RolePermissions>> + Send;
    /// Returns whether an override existed.
    fn delete(&self, role: Role) -> impl Future<Output = GatepassResult<bool>> + Send;
}

// ---------------------------------------------------------------------------
// Activity log (append-only)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ActivityLogFilter {
    /// Case-insensitive substring over actor name, username and details.
    pub search: Option<String>,
    pub action: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ActivityLogFilter {
    /// Restrict to `[day 00:00Z, day+1 00:00Z)`.
    pub fn for_day(mut self, day: NaiveDate) -> Self {
        let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
        self.from = Some(start);
        self.to = Some(start + chrono::Duration::days(1));
        self
    }
}

pub trait ActivityLogRepository: Send + Sync {
    /// Append a new entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateActivityLogEntry,
    ) -> impl Future<Output = GatepassResult<ActivityLogEntry>> + Send;
    /// Newest first; `total` counts every match regardless of the window.
    fn list(
        &self,
        filter: ActivityLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = GatepassResult<PaginatedResult<ActivityLogEntry>>> + Send;
    /// Sorted, de-duplicated action names present in the log.
    fn distinct_actions(&self) -> impl Future<Output = GatepassResult<Vec<String>>> + Send;
}
