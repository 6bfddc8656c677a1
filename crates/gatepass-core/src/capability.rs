//! Capabilities and the default role/capability matrix.
//!
//! Resolution is pure: given a role and the override record stored for it
//! (if any), produce the effective [`CapabilitySet`]. An override replaces
//! the role's defaults wholesale; capabilities it omits are denied.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GatepassError;
use crate::models::role_permissions::RolePermissions;
use crate::models::user::Role;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    CanCreatePermits,
    CanEditPermits,
    CanDeletePermits,
    CanClosePermits,
    CanReopenPermits,
    CanViewPermits,
    CanExportPermits,
    CanManageUsers,
    CanViewStatistics,
    CanViewActivityLog,
    CanManagePermissions,
    CanReopenAnyPermit,
}

impl Capability {
    pub const ALL: [Capability; 12] = [
        Capability::CanCreatePermits,
        Capability::CanEditPermits,
        Capability::CanDeletePermits,
        Capability::CanClosePermits,
        Capability::CanReopenPermits,
        Capability::CanViewPermits,
        Capability::CanExportPermits,
        Capability::CanManageUsers,
        Capability::CanViewStatistics,
        Capability::CanViewActivityLog,
        Capability::CanManagePermissions,
        Capability::CanReopenAnyPermit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CanCreatePermits => "canCreatePermits",
            Capability::CanEditPermits => "canEditPermits",
            Capability::CanDeletePermits => "canDeletePermits",
            Capability::CanClosePermits => "canClosePermits",
            Capability::CanReopenPermits => "canReopenPermits",
            Capability::CanViewPermits => "canViewPermits",
            Capability::CanExportPermits => "canExportPermits",
            Capability::CanManageUsers => "canManageUsers",
            Capability::CanViewStatistics => "canViewStatistics",
            Capability::CanViewActivityLog => "canViewActivityLog",
            Capability::CanManagePermissions => "canManagePermissions",
            Capability::CanReopenAnyPermit => "canReopenAnyPermit",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = GatepassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| GatepassError::validation(format!("unknown capability: {s}")))
    }
}

/// The set of capabilities granted to an actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keep only the capabilities mapped to `true`.
    pub fn from_map(map: &BTreeMap<Capability, bool>) -> Self {
        Self(
            map.iter()
                .filter(|(_, granted)| **granted)
                .map(|(cap, _)| *cap)
                .collect(),
        )
    }

    /// Full map over every capability, as the client expects it.
    pub fn to_map(&self) -> BTreeMap<Capability, bool> {
        Capability::ALL
            .into_iter()
            .map(|cap| (cap, self.contains(cap)))
            .collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One matrix row: `[admin, manager, security_officer, observer]`.
fn row(capability: Capability) -> [bool; 4] {
    use Capability::*;
    match capability {
        CanCreatePermits => [true, true, false, false],
        CanEditPermits => [true, true, false, false],
        CanDeletePermits => [true, false, false, false],
        CanClosePermits => [true, true, true, false],
        CanReopenPermits => [true, true, true, false],
        CanViewPermits => [true, true, true, true],
        CanExportPermits => [true, true, false, false],
        CanManageUsers => [true, false, false, false],
        CanViewStatistics => [true, true, false, false],
        CanViewActivityLog => [true, true, true, false],
        CanManagePermissions => [true, false, false, false],
        CanReopenAnyPermit => [true, true, false, false],
    }
}

fn column(role: Role) -> usize {
    match role {
        Role::Admin => 0,
        Role::Manager => 1,
        Role::SecurityOfficer => 2,
        Role::Observer => 3,
    }
}

pub fn default_capabilities(role: Role) -> CapabilitySet {
    let col = column(role);
    Capability::ALL
        .into_iter()
        .filter(|cap| row(*cap)[col])
        .collect()
}

/// Effective capabilities for `role`: the override verbatim when one is
/// stored, the default column otherwise.
pub fn resolve(role: Role, override_record: Option<&RolePermissions>) -> CapabilitySet {
    match override_record {
        Some(record) => CapabilitySet::from_map(&record.capabilities),
        None => default_capabilities(role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn default_matrix_matches_table() {
        use Capability::*;
        let expected: [(Role, &[Capability]); 4] = [
            (Role::Admin, &Capability::ALL),
            (
                Role::Manager,
                &[
                    CanCreatePermits,
                    CanEditPermits,
                    CanClosePermits,
                    CanReopenPermits,
                    CanViewPermits,
                    CanExportPermits,
                    CanViewStatistics,
                    CanViewActivityLog,
                    CanReopenAnyPermit,
                ],
            ),
            (
                Role::SecurityOfficer,
                &[
                    CanClosePermits,
                    CanReopenPermits,
                    CanViewPermits,
                    CanViewActivityLog,
                ],
            ),
            (Role::Observer, &[CanViewPermits]),
        ];
        for (role, caps) in expected {
            let want: CapabilitySet = caps.iter().copied().collect();
            assert_eq!(default_capabilities(role), want, "role {role}");
        }
    }

    #[test]
    fn no_override_uses_defaults() {
        for role in Role::ALL {
            assert_eq!(resolve(role, None), default_capabilities(role));
        }
    }

    #[test]
    fn full_override_is_used_verbatim() {
        let record = RolePermissions {
            role: Role::Observer,
            capabilities: Capability::ALL.into_iter().map(|c| (c, true)).collect(),
            updated_at: Utc::now(),
        };
        assert_eq!(resolve(Role::Observer, Some(&record)).len(), 12);
    }

    #[test]
    fn partial_override_denies_omitted_capabilities() {
        let record = RolePermissions {
            role: Role::Manager,
            capabilities: BTreeMap::from([(Capability::CanCreatePermits, true)]),
            updated_at: Utc::now(),
        };
        let caps = resolve(Role::Manager, Some(&record));
        assert!(caps.contains(Capability::CanCreatePermits));
        assert!(!caps.contains(Capability::CanViewPermits));
        assert_eq!(caps.len(), 1);
    }

    #[test]
    fn to_map_covers_every_capability() {
        let map = default_capabilities(Role::Observer).to_map();
        assert_eq!(map.len(), 12);
        assert_eq!(map[&Capability::CanViewPermits], true);
        assert_eq!(map[&Capability::CanManageUsers], false);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["canViewPermits"], true);
    }
}
