//! Shared application state.

use std::sync::Arc;

use gatepass_auth::{AuthConfig, AuthService};
use gatepass_db::repository::{
    SurrealActivityLogRepository, SurrealPermitRepository, SurrealRolePermissionRepository,
    SurrealUserRepository,
};
use gatepass_permits::{
    ActivityAuditor, PermissionResolver, PermitService, ReportService, UserAdminService,
};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

pub type Users = SurrealUserRepository<Any>;
pub type Permits = SurrealPermitRepository<Any>;
pub type RolePermissions = SurrealRolePermissionRepository<Any>;
pub type ActivityLog = SurrealActivityLogRepository<Any>;

#[derive(Clone)]
pub struct AppState {
    pub db: Surreal<Any>,
    pub auth: Arc<AuthService<Users>>,
    pub auditor: ActivityAuditor<ActivityLog>,
    pub permits: Arc<PermitService<Permits, RolePermissions, ActivityLog>>,
    pub users: Arc<UserAdminService<Users, RolePermissions, ActivityLog>>,
    pub reports: Arc<ReportService<Permits, Users, ActivityLog, RolePermissions>>,
}

impl AppState {
    pub fn new(db: Surreal<Any>, auth_config: AuthConfig) -> Self {
        let users = SurrealUserRepository::with_pepper(db.clone(), auth_config.pepper.clone());
        let resolver = PermissionResolver::new(SurrealRolePermissionRepository::new(db.clone()));
        let auditor = ActivityAuditor::new(SurrealActivityLogRepository::new(db.clone()));

        let min_password_length = auth_config.min_password_length;

        Self {
            auth: Arc::new(AuthService::new(users.clone(), auth_config)),
            permits: Arc::new(PermitService::new(
                SurrealPermitRepository::new(db.clone()),
                resolver.clone(),
                auditor.clone(),
            )),
            users: Arc::new(
                UserAdminService::new(users.clone(), resolver.clone(), auditor.clone())
                    .with_min_password_length(min_password_length),
            ),
            reports: Arc::new(ReportService::new(
                SurrealPermitRepository::new(db.clone()),
                users,
                auditor.clone(),
                resolver,
            )),
            auditor,
            db,
        }
    }
}
