//! Gatepass Permits — the services behind every permit, user and report
//! operation.
//!
//! Each service is generic over the `gatepass-core` repository traits and
//! follows the same order on every mutation: check the capability, apply
//! the lifecycle rules, persist, then append an activity record.

pub mod audit;
pub mod permits;
pub mod reports;
pub mod resolver;
pub mod users;

pub use audit::ActivityAuditor;
pub use permits::{PermitQuery, PermitService};
pub use reports::{ActivityQuery, ReportService};
pub use resolver::PermissionResolver;
pub use users::{NewUser, UserAdminService, UserPatch};
