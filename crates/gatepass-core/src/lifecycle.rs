//! Pure permit lifecycle rules.
//!
//! These functions decide whether a transition is allowed from data the
//! caller already holds. Persisting the transition, and arbitrating races
//! between concurrent transitions, is the repository's job.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{GatepassError, GatepassResult};
use crate::models::permit::Permit;
use crate::models::user::{Region, User};

/// A closer without `canReopenAnyPermit` may reopen their own permit for
/// this long after closing it.
pub const REOPEN_WINDOW_SECS: i64 = 3600;

pub fn reopen_window() -> Duration {
    Duration::seconds(REOPEN_WINDOW_SECS)
}

/// Admins and managers act everywhere; everyone else only in their regions.
pub fn ensure_region_access(actor: &User, region: &str) -> GatepassResult<()> {
    if actor.role.bypasses_region_scope() || actor.has_region(region) {
        Ok(())
    } else {
        Err(GatepassError::denied("access denied"))
    }
}

pub fn ensure_can_edit(permit: &Permit) -> GatepassResult<()> {
    if permit.is_closed() {
        return Err(GatepassError::invalid_state("cannot edit closed permit"));
    }
    Ok(())
}

pub fn ensure_can_close(permit: &Permit) -> GatepassResult<()> {
    if permit.is_closed() {
        return Err(GatepassError::invalid_state("permit is already closed"));
    }
    Ok(())
}

/// State and ownership checks for reopening `permit` at `now`.
pub fn ensure_can_reopen(
    permit: &Permit,
    actor_id: Uuid,
    can_reopen_any: bool,
    now: DateTime<Utc>,
) -> GatepassResult<()> {
    let Some(closed_at) = permit.closed_at else {
        return Err(GatepassError::invalid_state("permit is not closed"));
    };
    if reopen_allowed(actor_id, permit.closed_by, closed_at, now, can_reopen_any) {
        Ok(())
    } else {
        Err(GatepassError::denied("cannot reopen this permit"))
    }
}

pub fn reopen_allowed(
    actor_id: Uuid,
    closed_by: Option<Uuid>,
    closed_at: DateTime<Utc>,
    now: DateTime<Utc>,
    can_reopen_any: bool,
) -> bool {
    if can_reopen_any {
        return true;
    }
    closed_by == Some(actor_id) && now - closed_at < reopen_window()
}

/// Which regions a permit listing is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionScope {
    All,
    Only(Vec<Region>),
}

impl RegionScope {
    pub fn for_actor(actor: &User) -> Self {
        if actor.role.bypasses_region_scope() {
            RegionScope::All
        } else {
            RegionScope::Only(actor.regions.clone())
        }
    }

    pub fn allows(&self, region: &str) -> bool {
        match self {
            RegionScope::All => true,
            RegionScope::Only(regions) => regions.iter().any(|r| r == region),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn user(role: Role, regions: &[&str]) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "officer".into(),
            email: "officer@example.com".into(),
            password_hash: String::new(),
            first_name: "Sam".into(),
            last_name: "Guard".into(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
            role,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn reopen_window_for_own_permit() {
        let me = Uuid::new_v4();
        let now = Utc::now();
        assert!(reopen_allowed(me, Some(me), now - Duration::minutes(30), now, false));
        assert!(!reopen_allowed(me, Some(me), now - Duration::minutes(90), now, false));
        assert!(!reopen_allowed(me, Some(me), now - Duration::minutes(60), now, false));
    }

    #[test]
    fn reopen_other_closer_needs_reopen_any() {
        let me = Uuid::new_v4();
        let other = Some(Uuid::new_v4());
        let now = Utc::now();
        assert!(!reopen_allowed(me, other, now - Duration::minutes(5), now, false));
        assert!(reopen_allowed(me, other, now - Duration::days(30), now, true));
        assert!(reopen_allowed(me, None, now, now, true));
    }

    #[test]
    fn region_access_by_role() {
        let officer = user(Role::SecurityOfficer, &["riyadh"]);
        assert!(ensure_region_access(&officer, "riyadh").is_ok());
        assert!(matches!(
            ensure_region_access(&officer, "jeddah"),
            Err(GatepassError::AuthorizationDenied { .. })
        ));
        let manager = user(Role::Manager, &["riyadh"]);
        assert!(ensure_region_access(&manager, "jeddah").is_ok());
    }

    #[test]
    fn scope_for_actor() {
        assert_eq!(RegionScope::for_actor(&user(Role::Admin, &["hq"])), RegionScope::All);
        let scope = RegionScope::for_actor(&user(Role::Observer, &["hq", "dammam"]));
        assert!(scope.allows("dammam"));
        assert!(!scope.allows("riyadh"));
    }
}
