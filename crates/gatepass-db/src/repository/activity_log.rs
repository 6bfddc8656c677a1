//! SurrealDB implementation of [`ActivityLogRepository`].
//!
//! The `activity_log` table denies UPDATE and DELETE at the schema level;
//! this repository only appends and reads.

use chrono::{DateTime, Utc};
use gatepass_core::error::GatepassResult;
use gatepass_core::models::activity::{ActivityLogEntry, CreateActivityLogEntry};
use gatepass_core::repository::{
    ActivityLogFilter, ActivityLogRepository, PaginatedResult, Pagination,
};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ActivityRow {
    actor_id: String,
    actor_name: String,
    actor_username: String,
    action: String,
    details: String,
    source_ip: String,
    user_agent: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ActivityRowWithId {
    record_id: String,
    actor_id: String,
    actor_name: String,
    actor_username: String,
    action: String,
    details: String,
    source_ip: String,
    user_agent: String,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ActionRow {
    action: String,
}

impl ActivityRow {
    fn into_entry(self, id: Uuid) -> Result<ActivityLogEntry, DbError> {
        Ok(ActivityLogEntry {
            id,
            actor_id: parse_uuid(&self.actor_id)?,
            actor_name: self.actor_name,
            actor_username: self.actor_username,
            action: self.action,
            details: self.details,
            timestamp: self.timestamp,
            source_ip: self.source_ip,
            user_agent: self.user_agent,
        })
    }
}

impl ActivityRowWithId {
    fn try_into_entry(self) -> Result<ActivityLogEntry, DbError> {
        let id = parse_uuid(&self.record_id)?;
        ActivityRow {
            actor_id: self.actor_id,
            actor_name: self.actor_name,
            actor_username: self.actor_username,
            action: self.action,
            details: self.details,
            source_ip: self.source_ip,
            user_agent: self.user_agent,
            timestamp: self.timestamp,
        }
        .into_entry(id)
    }
}

/// Build the shared WHERE clause so the page and the count always agree.
fn where_clause(filter: &ActivityLogFilter) -> String {
    let mut conditions = Vec::new();
    if filter.search.is_some() {
        conditions.push(
            "(string::contains(string::lowercase(actor_name), $search) \
             OR string::contains(string::lowercase(actor_username), $search) \
             OR string::contains(string::lowercase(details), $search))",
        );
    }
    if filter.action.is_some() {
        conditions.push("action = $action");
    }
    if filter.from.is_some() {
        conditions.push("timestamp >= $from");
    }
    if filter.to.is_some() {
        conditions.push("timestamp < $to");
    }
    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

/// SurrealDB implementation of the activity log repository.
#[derive(Clone)]
pub struct SurrealActivityLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealActivityLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ActivityLogRepository for SurrealActivityLogRepository<C> {
    async fn append(&self, input: CreateActivityLogEntry) -> GatepassResult<ActivityLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('activity_log', $id) SET \
                 actor_id = $actor_id, actor_name = $actor_name, \
                 actor_username = $actor_username, \
                 action = $action, details = $details, \
                 source_ip = $source_ip, user_agent = $user_agent, \
                 timestamp = $now",
            )
            .bind(("id", id_str.clone()))
            .bind(("actor_id", input.actor_id.to_string()))
            .bind(("actor_name", input.actor_name))
            .bind(("actor_username", input.actor_username))
            .bind(("action", input.action.as_str().to_string()))
            .bind(("details", input.details))
            .bind(("source_ip", input.source_ip))
            .bind(("user_agent", input.user_agent))
            .bind(("now", Utc::now()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("activity_log", e))?;

        let rows: Vec<ActivityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("activity_log", &id_str))?;

        Ok(row.into_entry(id)?)
    }

    async fn list(
        &self,
        filter: ActivityLogFilter,
        pagination: Pagination,
    ) -> GatepassResult<PaginatedResult<ActivityLogEntry>> {
        let clause = where_clause(&filter);
        let query = format!(
            "SELECT count() AS total FROM activity_log {clause} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM activity_log {clause} \
             ORDER BY timestamp DESC \
             LIMIT $limit START $offset"
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(search) = filter.search {
            builder = builder.bind(("search", search.to_lowercase()));
        }
        if let Some(action) = filter.action {
            builder = builder.bind(("action", action));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<ActivityRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn distinct_actions(&self) -> GatepassResult<Vec<String>> {
        let mut result = self
            .db
            .query("SELECT action FROM activity_log GROUP BY action")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActionRow> = result.take(0).map_err(DbError::from)?;
        let mut actions: Vec<String> = rows.into_iter().map(|r| r.action).collect();
        actions.sort();
        actions.dedup();
        Ok(actions)
    }
}
