//! Activity log domain model.
//!
//! Entries are append-only. The `details` string follows a fixed grammar
//! per action so the subject (permit number or username) can be parsed
//! back out: it is always the token following the word `permit` or `user`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GatepassError;
use crate::models::user::Role;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    CreatePermit,
    UpdatePermit,
    ClosePermit,
    ReopenPermit,
    DeletePermit,
    ExportPermits,
    Login,
    CreateUser,
    UpdateUser,
    DeleteUser,
    ResetPassword,
    UpdateRolePermissions,
}

impl ActivityAction {
    pub const ALL: [ActivityAction; 12] = [
        ActivityAction::CreatePermit,
        ActivityAction::UpdatePermit,
        ActivityAction::ClosePermit,
        ActivityAction::ReopenPermit,
        ActivityAction::DeletePermit,
        ActivityAction::ExportPermits,
        ActivityAction::Login,
        ActivityAction::CreateUser,
        ActivityAction::UpdateUser,
        ActivityAction::DeleteUser,
        ActivityAction::ResetPassword,
        ActivityAction::UpdateRolePermissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::CreatePermit => "create_permit",
            ActivityAction::UpdatePermit => "update_permit",
            ActivityAction::ClosePermit => "close_permit",
            ActivityAction::ReopenPermit => "reopen_permit",
            ActivityAction::DeletePermit => "delete_permit",
            ActivityAction::ExportPermits => "export_permits",
            ActivityAction::Login => "login",
            ActivityAction::CreateUser => "create_user",
            ActivityAction::UpdateUser => "update_user",
            ActivityAction::DeleteUser => "delete_user",
            ActivityAction::ResetPassword => "reset_password",
            ActivityAction::UpdateRolePermissions => "update_role_permissions",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = GatepassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| GatepassError::validation(format!("unknown action: {s}")))
    }
}

/// A stored activity record. `action` stays a string so rows written by
/// older deployments remain readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub actor_name: String,
    pub actor_username: String,
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
    pub source_ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct CreateActivityLogEntry {
    pub actor_id: Uuid,
    pub actor_name: String,
    pub actor_username: String,
    pub action: ActivityAction,
    pub details: String,
    pub source_ip: String,
    pub user_agent: String,
}

pub mod details {
    //! Builders for the `details` column.

    use super::Role;

    pub fn created_permit(number: &str) -> String {
        format!("Created permit {number}")
    }

    pub fn updated_permit(number: &str) -> String {
        format!("Updated permit {number}")
    }

    pub fn closed_permit(number: &str) -> String {
        format!("Closed permit {number}")
    }

    pub fn reopened_permit(number: &str) -> String {
        format!("Reopened permit {number}")
    }

    pub fn deleted_permit(number: &str, carrier: &str) -> String {
        format!("Deleted permit {number} for {carrier}")
    }

    pub fn exported_permits(count: usize) -> String {
        format!("Exported {count} permits")
    }

    pub fn created_user(username: &str) -> String {
        format!("Created user {username}")
    }

    pub fn updated_user(username: &str) -> String {
        format!("Updated user {username}")
    }

    pub fn deleted_user(username: &str) -> String {
        format!("Deleted user {username}")
    }

    pub fn logged_in(username: &str) -> String {
        format!("User {username} logged in")
    }

    pub fn password_reset(username: &str) -> String {
        format!("Password reset for user {username}")
    }

    pub fn updated_role_permissions(role: Role) -> String {
        format!("Updated permissions for role {role}")
    }
}

fn token_after<'a>(details: &'a str, keyword: &str) -> Option<&'a str> {
    let mut words = details.split_whitespace();
    while let Some(word) = words.next() {
        if word.eq_ignore_ascii_case(keyword) {
            return words.next();
        }
    }
    None
}

/// The permit number named in a permit-related `details` string.
pub fn extract_permit_number(details: &str) -> Option<&str> {
    token_after(details, "permit")
}

/// The username named in a user-related `details` string.
pub fn extract_username(details: &str) -> Option<&str> {
    token_after(details, "user")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permit_details_round_trip() {
        for d in [
            details::created_permit("MHV0000001"),
            details::updated_permit("MHV0000001"),
            details::closed_permit("MHV0000001"),
            details::reopened_permit("MHV0000001"),
            details::deleted_permit("MHV0000001", "Acme Haulage"),
        ] {
            assert_eq!(extract_permit_number(&d), Some("MHV0000001"), "{d}");
        }
    }

    #[test]
    fn user_details_round_trip() {
        for d in [
            details::created_user("jdoe"),
            details::updated_user("jdoe"),
            details::deleted_user("jdoe"),
            details::logged_in("jdoe"),
            details::password_reset("jdoe"),
        ] {
            assert_eq!(extract_username(&d), Some("jdoe"), "{d}");
        }
    }

    #[test]
    fn extraction_misses_cleanly() {
        assert_eq!(extract_permit_number(&details::exported_permits(3)), None);
        assert_eq!(extract_username("Closed permit ABC1"), None);
    }

    #[test]
    fn action_wire_names() {
        for action in ActivityAction::ALL {
            assert_eq!(action.as_str().parse::<ActivityAction>().unwrap(), action);
        }
        assert_eq!(
            details::updated_role_permissions(Role::SecurityOfficer),
            "Updated permissions for role security_officer"
        );
    }
}
