//! SurrealDB implementation of [`PermitRepository`].
//!
//! Materials are embedded in the permit record, so creating or deleting a
//! permit writes its materials in the same statement. Lifecycle
//! transitions are single conditional `UPDATE`s; an empty result means the
//! permit is missing or was not in the expected state.

use chrono::{DateTime, NaiveDate, Utc};
use gatepass_core::error::GatepassResult;
use gatepass_core::lifecycle::RegionScope;
use gatepass_core::models::permit::{
    ClosePermit, CreatePermit, Material, Permit, RequestType, UpdatePermit,
};
use gatepass_core::repository::{PermitFilter, PermitRepository};
use serde::{Deserialize, Serialize};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage shape of an embedded material.
#[derive(Debug, Serialize, Deserialize)]
struct StoredMaterial {
    id: String,
    description: String,
    serial_number: String,
}

fn materials_to_value(materials: Vec<Material>) -> Result<serde_json::Value, DbError> {
    let stored: Vec<StoredMaterial> = materials
        .into_iter()
        .map(|m| StoredMaterial {
            id: m.id,
            description: m.description,
            serial_number: m.serial_number,
        })
        .collect();
    serde_json::to_value(stored).map_err(|e| DbError::Corrupt(format!("materials: {e}")))
}

fn materials_from_value(value: serde_json::Value) -> Result<Vec<Material>, DbError> {
    let stored: Vec<StoredMaterial> =
        serde_json::from_value(value).map_err(|e| DbError::Corrupt(format!("materials: {e}")))?;
    Ok(stored
        .into_iter()
        .map(|m| Material {
            id: m.id,
            description: m.description,
            serial_number: m.serial_number,
        })
        .collect())
}

#[derive(Debug, SurrealValue)]
struct PermitRow {
    permit_number: String,
    date: String,
    region: String,
    location: String,
    carrier_name: String,
    carrier_id: String,
    request_type: String,
    vehicle_plate: String,
    materials: serde_json::Value,
    created_by: String,
    created_at: DateTime<Utc>,
    closed_by: Option<String>,
    closed_at: Option<DateTime<Utc>>,
    closed_by_name: Option<String>,
    can_reopen: bool,
}

#[derive(Debug, SurrealValue)]
struct PermitRowWithId {
    record_id: String,
    permit_number: String,
    date: String,
    region: String,
    location: String,
    carrier_name: String,
    carrier_id: String,
    request_type: String,
    vehicle_plate: String,
    materials: serde_json::Value,
    created_by: String,
    created_at: DateTime<Utc>,
    closed_by: Option<String>,
    closed_at: Option<DateTime<Utc>>,
    closed_by_name: Option<String>,
    can_reopen: bool,
}

impl PermitRow {
    fn into_permit(self, id: Uuid) -> Result<Permit, DbError> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|e| DbError::Corrupt(format!("invalid permit date {}: {e}", self.date)))?;
        let request_type: RequestType = self
            .request_type
            .parse()
            .map_err(|_| DbError::Corrupt(format!("unknown request type: {}", self.request_type)))?;
        Ok(Permit {
            id,
            permit_number: self.permit_number,
            date,
            region: self.region,
            location: self.location,
            carrier_name: self.carrier_name,
            carrier_id: self.carrier_id,
            request_type,
            vehicle_plate: self.vehicle_plate,
            materials: materials_from_value(self.materials)?,
            created_by: parse_uuid(&self.created_by)?,
            created_at: self.created_at,
            closed_by: self.closed_by.as_deref().map(parse_uuid).transpose()?,
            closed_at: self.closed_at,
            closed_by_name: self.closed_by_name,
            can_reopen: self.can_reopen,
        })
    }
}

impl PermitRowWithId {
    fn try_into_permit(self) -> Result<Permit, DbError> {
        let id = parse_uuid(&self.record_id)?;
        PermitRow {
            permit_number: self.permit_number,
            date: self.date,
            region: self.region,
            location: self.location,
            carrier_name: self.carrier_name,
            carrier_id: self.carrier_id,
            request_type: self.request_type,
            vehicle_plate: self.vehicle_plate,
            materials: self.materials,
            created_by: self.created_by,
            created_at: self.created_at,
            closed_by: self.closed_by,
            closed_at: self.closed_at,
            closed_by_name: self.closed_by_name,
            can_reopen: self.can_reopen,
        }
        .into_permit(id)
    }
}

fn first_permit(rows: Vec<PermitRow>, id: Uuid) -> Result<Option<Permit>, DbError> {
    rows.into_iter().next().map(|row| row.into_permit(id)).transpose()
}

/// SurrealDB implementation of the Permit repository.
#[derive(Clone)]
pub struct SurrealPermitRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermitRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermitRepository for SurrealPermitRepository<C> {
    async fn create(&self, input: CreatePermit) -> GatepassResult<Permit> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let materials = materials_to_value(input.materials)?;

        let result = self
            .db
            .query(
                "CREATE type::record('permit', $id) SET \
                 permit_number = $permit_number, date = $date, \
                 region = $region, location = $location, \
                 carrier_name = $carrier_name, carrier_id = $carrier_id, \
                 request_type = $request_type, \
                 vehicle_plate = $vehicle_plate, \
                 materials = $materials, \
                 created_by = $created_by, created_at = $now, \
                 closed_by = NONE, closed_at = NONE, \
                 closed_by_name = NONE, can_reopen = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("permit_number", input.permit_number))
            .bind(("date", input.date.format(DATE_FORMAT).to_string()))
            .bind(("region", input.region))
            .bind(("location", input.location))
            .bind(("carrier_name", input.carrier_name))
            .bind(("carrier_id", input.carrier_id))
            .bind(("request_type", input.request_type.as_str().to_string()))
            .bind(("vehicle_plate", input.vehicle_plate))
            .bind(("materials", materials))
            .bind(("created_by", input.created_by.to_string()))
            .bind(("now", Utc::now()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("permit", e))?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_permit(rows, id)?.ok_or_else(|| DbError::not_found("permit", &id_str))?)
    }

    async fn get_by_id(&self, id: Uuid) -> GatepassResult<Permit> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('permit', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_permit(rows, id)?.ok_or_else(|| DbError::not_found("permit", &id_str))?)
    }

    async fn get_by_number(&self, permit_number: &str) -> GatepassResult<Option<Permit>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permit \
                 WHERE permit_number = $permit_number",
            )
            .bind(("permit_number", permit_number.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermitRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.try_into_permit())
            .transpose()?)
    }

    async fn update_open(&self, id: Uuid, input: UpdatePermit) -> GatepassResult<Option<Permit>> {
        if input.is_empty() {
            return match self.get_by_id(id).await {
                Ok(permit) if !permit.is_closed() => Ok(Some(permit)),
                Ok(_) => Ok(None),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            };
        }

        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.permit_number.is_some() {
            sets.push("permit_number = $permit_number");
        }
        if input.date.is_some() {
            sets.push("date = $date");
        }
        if input.region.is_some() {
            sets.push("region = $region");
        }
        if input.location.is_some() {
            sets.push("location = $location");
        }
        if input.carrier_name.is_some() {
            sets.push("carrier_name = $carrier_name");
        }
        if input.carrier_id.is_some() {
            sets.push("carrier_id = $carrier_id");
        }
        if input.request_type.is_some() {
            sets.push("request_type = $request_type");
        }
        if input.vehicle_plate.is_some() {
            sets.push("vehicle_plate = $vehicle_plate");
        }
        if input.materials.is_some() {
            sets.push("materials = $materials");
        }

        let query = format!(
            "UPDATE type::record('permit', $id) SET {} \
             WHERE closed_at IS NONE",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str));

        if let Some(permit_number) = input.permit_number {
            builder = builder.bind(("permit_number", permit_number));
        }
        if let Some(date) = input.date {
            builder = builder.bind(("date", date.format(DATE_FORMAT).to_string()));
        }
        if let Some(region) = input.region {
            builder = builder.bind(("region", region));
        }
        if let Some(location) = input.location {
            builder = builder.bind(("location", location));
        }
        if let Some(carrier_name) = input.carrier_name {
            builder = builder.bind(("carrier_name", carrier_name));
        }
        if let Some(carrier_id) = input.carrier_id {
            builder = builder.bind(("carrier_id", carrier_id));
        }
        if let Some(request_type) = input.request_type {
            builder = builder.bind(("request_type", request_type.as_str().to_string()));
        }
        if let Some(vehicle_plate) = input.vehicle_plate {
            builder = builder.bind(("vehicle_plate", vehicle_plate));
        }
        if let Some(materials) = input.materials {
            builder = builder.bind(("materials", materials_to_value(materials)?));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("permit", e))?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_permit(rows, id)?)
    }

    async fn close(&self, id: Uuid, input: ClosePermit) -> GatepassResult<Option<Permit>> {
        let result = self
            .db
            .query(
                "UPDATE type::record('permit', $id) SET \
                 closed_by = $closed_by, closed_at = $closed_at, \
                 closed_by_name = $closed_by_name, can_reopen = true \
                 WHERE closed_at IS NONE",
            )
            .bind(("id", id.to_string()))
            .bind(("closed_by", input.closed_by.to_string()))
            .bind(("closed_at", input.closed_at))
            .bind(("closed_by_name", input.closed_by_name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("permit", e))?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_permit(rows, id)?)
    }

    async fn reopen(&self, id: Uuid) -> GatepassResult<Option<Permit>> {
        let result = self
            .db
            .query(
                "UPDATE type::record('permit', $id) SET \
                 closed_by = NONE, closed_at = NONE, \
                 closed_by_name = NONE, can_reopen = true \
                 WHERE closed_at IS NOT NONE",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("permit", e))?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_permit(rows, id)?)
    }

    async fn delete(&self, id: Uuid) -> GatepassResult<Option<Permit>> {
        let mut result = self
            .db
            .query("DELETE type::record('permit', $id) RETURN BEFORE")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermitRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_permit(rows, id)?)
    }

    async fn list(&self, filter: PermitFilter) -> GatepassResult<Vec<Permit>> {
        let mut conditions = Vec::new();
        let regions = match filter.scope {
            RegionScope::All => None,
            RegionScope::Only(regions) => {
                conditions.push("region IN $regions");
                Some(regions)
            }
        };
        if filter.region.is_some() {
            conditions.push("region = $region");
        }
        if filter.date.is_some() {
            conditions.push("date = $date");
        }
        let search = filter
            .search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        if search.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(permit_number), $search) \
                 OR string::contains(string::lowercase(carrier_name), $search) \
                 OR string::contains(string::lowercase(carrier_id), $search) \
                 OR string::contains(string::lowercase(location), $search))",
            );
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM permit {where_clause} \
             ORDER BY created_at DESC"
        );

        let mut builder = self.db.query(&query);
        if let Some(regions) = regions {
            builder = builder.bind(("regions", regions));
        }
        if let Some(region) = filter.region {
            builder = builder.bind(("region", region));
        }
        if let Some(date) = filter.date {
            builder = builder.bind(("date", date.format(DATE_FORMAT).to_string()));
        }
        if let Some(search) = search {
            builder = builder.bind(("search", search));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<PermitRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_permit())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
