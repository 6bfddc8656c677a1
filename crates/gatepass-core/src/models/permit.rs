//! Permit domain model.
//!
//! A permit authorizes movement of materials and/or a heavy vehicle at a
//! region. Its lifecycle state is derived from `closed_at`: set means
//! [`PermitState::Closed`], absent means [`PermitState::Open`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GatepassError, GatepassResult};
use crate::models::user::Region;
use crate::validation;

/// Placeholder used for the material of vehicle-only permits.
pub const NOT_APPLICABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    MaterialEntrance,
    MaterialExit,
    HeavyVehicleEntranceExit,
    HeavyVehicleEntrance,
    HeavyVehicleExit,
}

impl RequestType {
    pub const ALL: [RequestType; 5] = [
        RequestType::MaterialEntrance,
        RequestType::MaterialExit,
        RequestType::HeavyVehicleEntranceExit,
        RequestType::HeavyVehicleEntrance,
        RequestType::HeavyVehicleExit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::MaterialEntrance => "material_entrance",
            RequestType::MaterialExit => "material_exit",
            RequestType::HeavyVehicleEntranceExit => "heavy_vehicle_entrance_exit",
            RequestType::HeavyVehicleEntrance => "heavy_vehicle_entrance",
            RequestType::HeavyVehicleExit => "heavy_vehicle_exit",
        }
    }

    /// Vehicle-only permits carry a single sentinel material.
    pub fn is_vehicle_only(&self) -> bool {
        matches!(self, RequestType::HeavyVehicleEntranceExit)
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = GatepassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GatepassError::validation(format!("unknown request type: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub description: String,
    pub serial_number: String,
}

impl Material {
    pub fn sentinel() -> Self {
        Self {
            id: "1".into(),
            description: NOT_APPLICABLE.into(),
            serial_number: NOT_APPLICABLE.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermitState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permit {
    pub id: Uuid,
    pub permit_number: String,
    pub date: NaiveDate,
    pub region: Region,
    pub location: String,
    pub carrier_name: String,
    pub carrier_id: String,
    pub request_type: RequestType,
    pub vehicle_plate: String,
    pub materials: Vec<Material>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub closed_by: Option<Uuid>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Write-time snapshot of the closer's name; survives account deletion.
    pub closed_by_name: Option<String>,
    pub can_reopen: bool,
}

impl Permit {
    pub fn state(&self) -> PermitState {
        if self.closed_at.is_some() {
            PermitState::Closed
        } else {
            PermitState::Open
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state() == PermitState::Closed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermit {
    pub permit_number: String,
    pub date: NaiveDate,
    pub region: Region,
    pub location: String,
    pub carrier_name: String,
    pub carrier_id: String,
    pub request_type: RequestType,
    pub vehicle_plate: String,
    pub materials: Vec<Material>,
    pub created_by: Uuid,
}

/// Partial update: `None` fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePermit {
    pub permit_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub region: Option<Region>,
    pub location: Option<String>,
    pub carrier_name: Option<String>,
    pub carrier_id: Option<String>,
    pub request_type: Option<RequestType>,
    pub vehicle_plate: Option<String>,
    pub materials: Option<Vec<Material>>,
}

impl UpdatePermit {
    pub fn is_empty(&self) -> bool {
        self.permit_number.is_none()
            && self.date.is_none()
            && self.region.is_none()
            && self.location.is_none()
            && self.carrier_name.is_none()
            && self.carrier_id.is_none()
            && self.request_type.is_none()
            && self.vehicle_plate.is_none()
            && self.materials.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ClosePermit {
    pub closed_by: Uuid,
    pub closed_by_name: String,
    pub closed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialDraft {
    pub id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub serial_number: String,
}

/// Unvalidated permit fields as submitted by a client.
///
/// Used for both creation (every field required) and editing (any
/// subset).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitDraft {
    pub permit_number: Option<String>,
    pub date: Option<String>,
    pub region: Option<String>,
    pub location: Option<String>,
    pub carrier_name: Option<String>,
    pub carrier_id: Option<String>,
    pub request_type: Option<String>,
    pub vehicle_plate: Option<String>,
    pub materials: Option<Vec<MaterialDraft>>,
}

impl PermitDraft {
    /// Validate a complete draft into a [`CreatePermit`].
    pub fn into_create(self, created_by: Uuid) -> GatepassResult<CreatePermit> {
        let permit_number = validation::permit_number(&required(self.permit_number, "permitNumber")?)?;
        let date = validation::permit_date(&required(self.date, "date")?)?;
        let region = validation::non_empty(&required(self.region, "region")?, "region")?;
        let location = validation::non_empty(&required(self.location, "location")?, "location")?;
        let carrier_name =
            validation::non_empty(&required(self.carrier_name, "carrierName")?, "carrierName")?;
        let carrier_id =
            validation::non_empty(&required(self.carrier_id, "carrierId")?, "carrierId")?;
        let request_type: RequestType = required(self.request_type, "requestType")?.trim().parse()?;
        let vehicle_plate =
            validation::non_empty(&required(self.vehicle_plate, "vehiclePlate")?, "vehiclePlate")?;

        let materials = if request_type.is_vehicle_only() {
            vec![Material::sentinel()]
        } else {
            validation::materials(self.materials.unwrap_or_default())?
        };

        Ok(CreatePermit {
            permit_number,
            date,
            region,
            location,
            carrier_name,
            carrier_id,
            request_type,
            vehicle_plate,
            materials,
            created_by,
        })
    }

    /// Validate whichever fields are present into an [`UpdatePermit`].
    ///
    /// Switching to a vehicle-only type replaces the materials with the
    /// sentinel regardless of what was supplied.
    pub fn into_update(self) -> GatepassResult<UpdatePermit> {
        let request_type = self
            .request_type
            .map(|t| t.trim().parse::<RequestType>())
            .transpose()?;
        let materials = match request_type {
            Some(t) if t.is_vehicle_only() => Some(vec![Material::sentinel()]),
            _ => self.materials.map(validation::materials).transpose()?,
        };

        Ok(UpdatePermit {
            permit_number: self
                .permit_number
                .as_deref()
                .map(validation::permit_number)
                .transpose()?,
            date: self
                .date
                .as_deref()
                .map(validation::permit_date)
                .transpose()?,
            region: optional(self.region, "region")?,
            location: optional(self.location, "location")?,
            carrier_name: optional(self.carrier_name, "carrierName")?,
            carrier_id: optional(self.carrier_id, "carrierId")?,
            request_type,
            vehicle_plate: optional(self.vehicle_plate, "vehiclePlate")?,
            materials,
        })
    }
}

fn required(value: Option<String>, field: &str) -> GatepassResult<String> {
    value.ok_or_else(|| GatepassError::validation(format!("{field} is required")))
}

fn optional(value: Option<String>, field: &str) -> GatepassResult<Option<String>> {
    value
        .as_deref()
        .map(|v| validation::non_empty(v, field))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> PermitDraft {
        PermitDraft {
            permit_number: Some("MHV0000001".into()),
            date: Some("2025-03-14".into()),
            region: Some("riyadh".into()),
            location: Some("Gate 4".into()),
            carrier_name: Some("Acme Haulage".into()),
            carrier_id: Some("7001234567".into()),
            request_type: Some("material_entrance".into()),
            vehicle_plate: Some("1234ABD".into()),
            materials: Some(vec![MaterialDraft {
                id: None,
                description: "Steel beams".into(),
                serial_number: "SB-001".into(),
            }]),
        }
    }

    #[test]
    fn complete_draft_validates() {
        let creator = Uuid::new_v4();
        let create = draft().into_create(creator).unwrap();
        assert_eq!(create.permit_number, "MHV0000001");
        assert_eq!(create.date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(create.request_type, RequestType::MaterialEntrance);
        assert_eq!(create.materials.len(), 1);
        assert!(!create.materials[0].id.is_empty());
        assert_eq!(create.created_by, creator);
    }

    #[test]
    fn missing_field_is_a_validation_error() {
        let mut d = draft();
        d.carrier_id = None;
        let err = d.into_create(Uuid::new_v4()).unwrap_err();
        assert!(err.to_string().contains("carrierId is required"));
    }

    #[test]
    fn empty_materials_rejected_for_material_permits() {
        let mut d = draft();
        d.materials = Some(vec![]);
        assert!(matches!(
            d.into_create(Uuid::new_v4()),
            Err(GatepassError::Validation { .. })
        ));
    }

    #[test]
    fn vehicle_only_permit_gets_sentinel_material() {
        let mut d = draft();
        d.request_type = Some("heavy_vehicle_entrance_exit".into());
        d.materials = None;
        let create = d.into_create(Uuid::new_v4()).unwrap();
        assert_eq!(create.materials, vec![Material::sentinel()]);
    }

    #[test]
    fn update_keeps_absent_fields_absent() {
        let update = PermitDraft {
            location: Some("Gate 7".into()),
            ..Default::default()
        }
        .into_update()
        .unwrap();
        assert_eq!(update.location.as_deref(), Some("Gate 7"));
        assert!(update.permit_number.is_none());
        assert!(update.materials.is_none());
        assert!(!update.is_empty());
    }

    #[test]
    fn switching_to_vehicle_only_forces_sentinel_material() {
        let update = PermitDraft {
            request_type: Some("heavy_vehicle_entrance_exit".into()),
            materials: Some(vec![MaterialDraft {
                id: None,
                description: "Steel".into(),
                serial_number: "S1".into(),
            }]),
            ..Default::default()
        }
        .into_update()
        .unwrap();
        assert_eq!(update.materials, Some(vec![Material::sentinel()]));

        let update = PermitDraft {
            request_type: Some("heavy_vehicle_entrance_exit".into()),
            ..Default::default()
        }
        .into_update()
        .unwrap();
        assert_eq!(update.materials, Some(vec![Material::sentinel()]));
    }

    #[test]
    fn update_rejects_blank_supplied_field() {
        let result = PermitDraft {
            carrier_name: Some("   ".into()),
            ..Default::default()
        }
        .into_update();
        assert!(result.is_err());
    }

    #[test]
    fn permit_serializes_camel_case() {
        let permit = Permit {
            id: Uuid::new_v4(),
            permit_number: "MHV0000001".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            region: "riyadh".into(),
            location: "Gate 4".into(),
            carrier_name: "Acme".into(),
            carrier_id: "1".into(),
            request_type: RequestType::MaterialExit,
            vehicle_plate: "1234ABD".into(),
            materials: vec![Material::sentinel()],
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            closed_by: None,
            closed_at: None,
            closed_by_name: None,
            can_reopen: true,
        };
        let json = serde_json::to_value(&permit).unwrap();
        assert_eq!(json["permitNumber"], "MHV0000001");
        assert_eq!(json["requestType"], "material_exit");
        assert_eq!(json["date"], "2025-03-14");
        assert_eq!(json["materials"][0]["serialNumber"], "N/A");
        assert!(json["closedAt"].is_null());
        assert_eq!(permit.state(), PermitState::Open);
    }
}
