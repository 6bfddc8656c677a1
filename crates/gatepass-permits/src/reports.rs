//! Dashboard statistics and activity-log queries.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate, Utc};
use gatepass_core::capability::Capability;
use gatepass_core::error::GatepassResult;
use gatepass_core::models::activity::ActivityLogEntry;
use gatepass_core::models::permit::Permit;
use gatepass_core::models::statistics::{NamedCount, Statistics};
use gatepass_core::models::user::User;
use gatepass_core::repository::{
    ActivityLogFilter, ActivityLogRepository, PaginatedResult, Pagination, PermitFilter,
    PermitRepository, RolePermissionRepository, UserRepository,
};
use gatepass_core::validation;
use serde::Deserialize;
use uuid::Uuid;

use crate::audit::ActivityAuditor;
use crate::resolver::PermissionResolver;

const TOP_N: usize = 10;
const TREND_DAYS: i64 = 30;

/// Activity-log query parameters as received from clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityQuery {
    pub search: Option<String>,
    pub action: Option<String>,
    pub date: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Clone)]
pub struct ReportService<P, U, A, R>
where
    P: PermitRepository,
    U: UserRepository,
    A: ActivityLogRepository,
    R: RolePermissionRepository,
{
    permits: P,
    users: U,
    auditor: ActivityAuditor<A>,
    resolver: PermissionResolver<R>,
}

impl<P, U, A, R> ReportService<P, U, A, R>
where
    P: PermitRepository,
    U: UserRepository,
    A: ActivityLogRepository,
    R: RolePermissionRepository,
{
    pub fn new(
        permits: P,
        users: U,
        auditor: ActivityAuditor<A>,
        resolver: PermissionResolver<R>,
    ) -> Self {
        Self {
            permits,
            users,
            auditor,
            resolver,
        }
    }

    pub async fn statistics(&self, viewer: &User) -> GatepassResult<Statistics> {
        self.resolver
            .require(Some(viewer), Capability::CanViewStatistics)
            .await?;

        let permits = self.permits.list(PermitFilter::default()).await?;
        let users = self.users.list().await?;
        Ok(summarize(&permits, &users, Utc::now().date_naive()))
    }

    pub async fn activity(
        &self,
        viewer: &User,
        query: ActivityQuery,
    ) -> GatepassResult<PaginatedResult<ActivityLogEntry>> {
        self.resolver
            .require(Some(viewer), Capability::CanViewActivityLog)
            .await?;

        let mut filter = ActivityLogFilter {
            search: query.search.filter(|s| !s.trim().is_empty()),
            action: query.action.filter(|a| !a.trim().is_empty()),
            ..Default::default()
        };
        if let Some(day) = validation::date_filter(query.date.as_deref())? {
            filter = filter.for_day(day);
        }
        self.auditor
            .query(filter, Pagination::clamped(query.offset, query.limit))
            .await
    }

    pub async fn activity_actions(&self, viewer: &User) -> GatepassResult<Vec<String>> {
        self.resolver
            .require(Some(viewer), Capability::CanViewActivityLog)
            .await?;
        self.auditor.distinct_actions().await
    }
}

fn summarize(permits: &[Permit], users: &[User], today: NaiveDate) -> Statistics {
    let closed = permits.iter().filter(|p| p.is_closed()).count() as u64;

    let names: HashMap<Uuid, String> = users.iter().map(|u| (u.id, u.display_name())).collect();
    let creator_name = |id: &Uuid| names.get(id).cloned().unwrap_or_else(|| id.to_string());

    let first_day = today - Duration::days(TREND_DAYS - 1);
    let mut per_day: BTreeMap<NaiveDate, u64> = (0..TREND_DAYS)
        .map(|offset| (first_day + Duration::days(offset), 0))
        .collect();
    for permit in permits {
        if let Some(count) = per_day.get_mut(&permit.created_at.date_naive()) {
            *count += 1;
        }
    }

    Statistics {
        total_permits: permits.len() as u64,
        open_permits: permits.len() as u64 - closed,
        closed_permits: closed,
        total_users: users.len() as u64,
        permits_by_region: ranked(permits.iter().map(|p| p.region.clone()), None),
        permits_by_type: ranked(permits.iter().map(|p| p.request_type.to_string()), None),
        daily_trend: per_day
            .into_iter()
            .map(|(day, count)| NamedCount {
                name: day.format("%Y-%m-%d").to_string(),
                count,
            })
            .collect(),
        top_carriers: ranked(permits.iter().map(|p| p.carrier_name.clone()), Some(TOP_N)),
        top_closers: ranked(
            permits.iter().filter_map(|p| p.closed_by_name.clone()),
            Some(TOP_N),
        ),
        top_creators: ranked(permits.iter().map(|p| creator_name(&p.created_by)), Some(TOP_N)),
    }
}

/// Count occurrences, highest first, ties by name.
fn ranked(values: impl Iterator<Item = String>, limit: Option<usize>) -> Vec<NamedCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    let mut ranked: Vec<NamedCount> = counts
        .into_iter()
        .map(|(name, count)| NamedCount { name, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gatepass_core::models::permit::{Material, RequestType};
    use gatepass_core::models::user::Role;

    fn user(first: &str, last: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: format!("{first}.{last}").to_lowercase(),
            email: format!("{first}@example.com").to_lowercase(),
            password_hash: String::new(),
            first_name: first.into(),
            last_name: last.into(),
            regions: vec!["north".into()],
            role: Role::Manager,
            last_login: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn permit(n: u32, region: &str, carrier: &str, creator: Uuid, day: NaiveDate) -> Permit {
        Permit {
            id: Uuid::new_v4(),
            permit_number: format!("ABC{n:04}"),
            date: day,
            region: region.into(),
            location: "Gate 1".into(),
            carrier_name: carrier.into(),
            carrier_id: "42".into(),
            request_type: RequestType::MaterialExit,
            vehicle_plate: "XYZ 1".into(),
            materials: vec![Material::sentinel()],
            created_by: creator,
            created_at: Utc.from_utc_datetime(&day.and_hms_opt(9, 0, 0).unwrap()),
            closed_by: None,
            closed_at: None,
            closed_by_name: None,
            can_reopen: true,
        }
    }

    #[test]
    fn summary_counts_and_rankings() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let alice = user("Alice", "Smith");
        let gone = Uuid::new_v4();

        let mut permits = vec![
            permit(1, "north", "Acme", alice.id, today),
            permit(2, "north", "Acme", alice.id, today),
            permit(3, "south", "Bolt", gone, today - Duration::days(3)),
            permit(4, "south", "Acme", alice.id, today - Duration::days(45)),
        ];
        permits[0].closed_at = Some(Utc::now());
        permits[0].closed_by = Some(alice.id);
        permits[0].closed_by_name = Some("Alice Smith [alice.smith]".into());

        let stats = summarize(&permits, std::slice::from_ref(&alice), today);

        assert_eq!(stats.total_permits, 4);
        assert_eq!(stats.open_permits, 3);
        assert_eq!(stats.closed_permits, 1);
        assert_eq!(stats.total_users, 1);
        assert_eq!(
            stats.top_carriers[0],
            NamedCount {
                name: "Acme".into(),
                count: 3
            }
        );
        assert_eq!(stats.permits_by_region.len(), 2);
        assert_eq!(stats.top_closers[0].name, "Alice Smith [alice.smith]");
        assert_eq!(stats.top_creators[0].name, "Alice Smith");
        assert_eq!(stats.top_creators[1].name, gone.to_string());

        assert_eq!(stats.daily_trend.len(), 30);
        assert_eq!(stats.daily_trend[0].name, "2025-06-01");
        let last = stats.daily_trend.last().unwrap();
        assert_eq!((last.name.as_str(), last.count), ("2025-06-30", 2));
        let total_in_window: u64 = stats.daily_trend.iter().map(|d| d.count).sum();
        assert_eq!(total_in_window, 3);
    }

    #[test]
    fn ranking_truncates_and_breaks_ties_by_name() {
        let values = (0..15).map(|i| format!("carrier-{i:02}"));
        let ranked = ranked(values, Some(TOP_N));
        assert_eq!(ranked.len(), TOP_N);
        assert_eq!(ranked[0].name, "carrier-00");
    }
}
