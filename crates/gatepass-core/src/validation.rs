//! Field-level input validation shared by the permit and user paths.

use chrono::NaiveDate;

use crate::error::{GatepassError, GatepassResult};
use crate::models::permit::{Material, MaterialDraft};
use crate::models::user::{DEFAULT_REGION, Region};

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Trim `value`, rejecting it if nothing remains.
pub fn non_empty(value: &str, field: &str) -> GatepassResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GatepassError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Three uppercase ASCII letters followed by at least one digit.
pub fn permit_number(value: &str) -> GatepassResult<String> {
    let value = value.trim();
    let bytes = value.as_bytes();
    let valid = bytes.len() > 3
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && bytes[3..].iter().all(u8::is_ascii_digit);
    if !valid {
        return Err(GatepassError::validation(format!(
            "invalid permit number: {value}"
        )));
    }
    Ok(value.to_string())
}

/// Calendar date in `YYYY-MM-DD` form. A full RFC 3339 timestamp is
/// accepted and truncated to its date.
pub fn permit_date(value: &str) -> GatepassResult<NaiveDate> {
    let value = value.trim();
    let date_part = value.split_once('T').map_or(value, |(d, _)| d);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| GatepassError::validation(format!("invalid date: {value}")))
}

/// Optional date filter from a query string. Blank means absent.
pub fn date_filter(value: Option<&str>) -> GatepassResult<Option<NaiveDate>> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(permit_date)
        .transpose()
}

/// At least one material, each with a description. Missing ids are
/// numbered by position.
pub fn materials(drafts: Vec<MaterialDraft>) -> GatepassResult<Vec<Material>> {
    if drafts.is_empty() {
        return Err(GatepassError::validation("at least one material is required"));
    }
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| {
            let id = draft
                .id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| (i + 1).to_string());
            Ok(Material {
                id,
                description: non_empty(&draft.description, "material description")?,
                serial_number: draft.serial_number.trim().to_string(),
            })
        })
        .collect()
}

pub fn username(value: &str) -> GatepassResult<String> {
    let value = value.trim();
    if value.chars().count() < MIN_USERNAME_LENGTH {
        return Err(GatepassError::validation(format!(
            "username must be at least {MIN_USERNAME_LENGTH} characters"
        )));
    }
    Ok(value.to_string())
}

pub fn password(value: &str, min_length: usize) -> GatepassResult<()> {
    if value.chars().count() < min_length {
        return Err(GatepassError::validation(format!(
            "password must be at least {min_length} characters"
        )));
    }
    Ok(())
}

/// Loose shape check: one `@` with a non-empty local part and a dotted
/// domain.
pub fn email(value: &str) -> GatepassResult<String> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(GatepassError::validation(format!("invalid email: {value}")));
    }
    Ok(value.to_lowercase())
}

/// Trimmed, non-blank regions; `[headquarters]` when none remain.
pub fn regions(regions: Option<Vec<Region>>) -> Vec<Region> {
    let regions: Vec<Region> = regions
        .unwrap_or_default()
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();
    if regions.is_empty() {
        vec![DEFAULT_REGION.to_string()]
    } else {
        regions
    }
}
