//! Integration tests for user administration, role-permission overrides
//! and reporting using in-memory SurrealDB.

use std::collections::BTreeMap;

use gatepass_core::actor::{ActorContext, ClientInfo};
use gatepass_core::capability::{self, Capability};
use gatepass_core::error::GatepassError;
use gatepass_core::models::activity::extract_username;
use gatepass_core::models::permit::PermitDraft;
use gatepass_core::models::user::{CreateUser, Role};
use gatepass_core::repository::UserRepository;
use gatepass_db::repository::{
    SurrealActivityLogRepository, SurrealPermitRepository, SurrealRolePermissionRepository,
    SurrealUserRepository,
};
use gatepass_permits::{
    ActivityAuditor, ActivityQuery, NewUser, PermissionResolver, PermitService, ReportService,
    UserAdminService, UserPatch,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Resolver = PermissionResolver<SurrealRolePermissionRepository<Db>>;

struct Harness {
    db: Surreal<Db>,
    users: SurrealUserRepository<Db>,
    resolver: Resolver,
    admin: UserAdminService<SurrealUserRepository<Db>, SurrealRolePermissionRepository<Db>, SurrealActivityLogRepository<Db>>,
    permits: PermitService<SurrealPermitRepository<Db>, SurrealRolePermissionRepository<Db>, SurrealActivityLogRepository<Db>>,
    reports: ReportService<
        SurrealPermitRepository<Db>,
        SurrealUserRepository<Db>,
        SurrealActivityLogRepository<Db>,
        SurrealRolePermissionRepository<Db>,
    >,
}

async fn setup() -> Harness {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gatepass_db::run_migrations(&db).await.unwrap();

    let resolver = PermissionResolver::new(SurrealRolePermissionRepository::new(db.clone()));
    let auditor = ActivityAuditor::new(SurrealActivityLogRepository::new(db.clone()));
    Harness {
        db: db.clone(),
        users: SurrealUserRepository::new(db.clone()),
        resolver: resolver.clone(),
        admin: UserAdminService::new(
            SurrealUserRepository::new(db.clone()),
            resolver.clone(),
            auditor.clone(),
        ),
        permits: PermitService::new(
            SurrealPermitRepository::new(db.clone()),
            resolver.clone(),
            auditor.clone(),
        ),
        reports: ReportService::new(
            SurrealPermitRepository::new(db.clone()),
            SurrealUserRepository::new(db),
            auditor,
            resolver,
        ),
    }
}

async fn actor(h: &Harness, username: &str, role: Role) -> ActorContext {
    let user = h
        .users
        .create(CreateUser {
            username: username.into(),
            email: format!("{username}@example.com"),
            password: "password123".into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            regions: vec!["headquarters".into()],
            role,
        })
        .await
        .unwrap();
    ActorContext::new(user, ClientInfo::default())
}

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.into(),
        password: "s3cure-pass".into(),
        email: format!("{username}@Example.com"),
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        regions: None,
        role: None,
    }
}

#[tokio::test]
async fn default_matrix_applies_without_overrides() {
    let h = setup().await;
    for role in Role::ALL {
        let user = actor(&h, role.as_str(), role).await.user;
        assert_eq!(
            h.resolver.effective_capabilities(&user).await.unwrap(),
            capability::default_capabilities(role),
            "{role}"
        );
    }
}

#[tokio::test]
async fn full_override_replaces_defaults() {
    let h = setup().await;
    let admin = actor(&h, "admin", Role::Admin).await;
    let observer = actor(&h, "observer", Role::Observer).await;

    let all_granted: BTreeMap<Capability, bool> =
        Capability::ALL.into_iter().map(|c| (c, true)).collect();
    h.admin
        .set_role_permissions(&admin, Role::Observer, all_granted)
        .await
        .unwrap();

    let caps = h.admin.my_permissions(&observer.user).await.unwrap();
    assert_eq!(caps.len(), Capability::ALL.len());
}

#[tokio::test]
async fn partial_override_denies_missing_capabilities() {
    let h = setup().await;
    let admin = actor(&h, "admin", Role::Admin).await;
    let manager = actor(&h, "manager", Role::Manager).await;

    let only_view = BTreeMap::from([(Capability::CanViewPermits, true)]);
    h.admin
        .set_role_permissions(&admin, Role::Manager, only_view)
        .await
        .unwrap();

    let caps = h.admin.my_permissions(&manager.user).await.unwrap();
    assert!(caps.contains(Capability::CanViewPermits));
    assert!(!caps.contains(Capability::CanCreatePermits));

    let draft = PermitDraft {
        permit_number: Some("MHV0000001".into()),
        ..Default::default()
    };
    let err = h.permits.create(&manager, draft).await.unwrap_err();
    assert!(matches!(err, GatepassError::AuthorizationDenied { .. }));

    h.admin
        .clear_role_permissions(&admin, Role::Manager)
        .await
        .unwrap();
    let caps = h.admin.my_permissions(&manager.user).await.unwrap();
    assert_eq!(caps, capability::default_capabilities(Role::Manager));

    let err = h
        .admin
        .clear_role_permissions(&admin, Role::Manager)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn only_admins_write_overrides() {
    let h = setup().await;
    let admin = actor(&h, "admin", Role::Admin).await;
    let manager = actor(&h, "manager", Role::Manager).await;

    // Even with canManagePermissions granted, a manager is still refused.
    let grant: BTreeMap<Capability, bool> =
        Capability::ALL.into_iter().map(|c| (c, true)).collect();
    h.admin
        .set_role_permissions(&admin, Role::Manager, grant)
        .await
        .unwrap();

    let err = h
        .admin
        .set_role_permissions(&manager, Role::Observer, BTreeMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GatepassError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn create_user_applies_defaults() {
    let h = setup().await;
    let admin = actor(&h, "admin", Role::Admin).await;

    let user = h.admin.create(&admin, new_user("jdoe")).await.unwrap();
    assert_eq!(user.role, Role::Observer);
    assert_eq!(user.regions, vec!["headquarters".to_string()]);
    assert_eq!(user.email, "jdoe@example.com");

    let mut officer = new_user("officer1");
    officer.role = Some("security_officer".into());
    officer.regions = Some(vec!["north".into(), " south ".into()]);
    let officer = h.admin.create(&admin, officer).await.unwrap();
    assert_eq!(officer.role, Role::SecurityOfficer);
    assert_eq!(officer.regions, vec!["north".to_string(), "south".to_string()]);
}

#[tokio::test]
async fn create_user_validates_and_detects_conflicts() {
    let h = setup().await;
    let admin = actor(&h, "admin", Role::Admin).await;
    h.admin.create(&admin, new_user("jdoe")).await.unwrap();

    let err = h.admin.create(&admin, new_user("jdoe")).await.unwrap_err();
    assert!(matches!(err, GatepassError::AlreadyExists { .. }));

    let mut short = new_user("jd");
    short.email = "jd@example.com".into();
    let err = h.admin.create(&admin, short).await.unwrap_err();
    assert!(matches!(err, GatepassError::Validation { .. }));

    let mut bad_role = new_user("someone");
    bad_role.role = Some("superuser".into());
    let err = h.admin.create(&admin, bad_role).await.unwrap_err();
    assert!(matches!(err, GatepassError::Validation { .. }));
}

#[tokio::test]
async fn manager_cannot_manage_users_by_default() {
    let h = setup().await;
    let manager = actor(&h, "manager", Role::Manager).await;

    let err = h.admin.list(&manager.user).await.unwrap_err();
    assert!(matches!(err, GatepassError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn update_user_patches_fields_and_rehashes_password() {
    let h = setup().await;
    let admin = actor(&h, "admin", Role::Admin).await;
    let target = h.admin.create(&admin, new_user("jdoe")).await.unwrap();

    let patch = UserPatch {
        password: Some("another-pass".into()),
        role: Some("manager".into()),
        regions: Some(vec!["east".into()]),
        ..Default::default()
    };
    let updated = h.admin.update(&admin, target.id, patch).await.unwrap();
    assert_eq!(updated.role, Role::Manager);
    assert_eq!(updated.regions, vec!["east".to_string()]);
    assert_eq!(updated.first_name, "Jane");
    assert!(updated.password_hash.starts_with("$argon2"));
    assert_ne!(updated.password_hash, target.password_hash);
}

#[tokio::test]
async fn update_user_rejects_taken_username_and_missing_target() {
    let h = setup().await;
    let admin = actor(&h, "admin", Role::Admin).await;
    h.admin.create(&admin, new_user("first")).await.unwrap();
    let second = h.admin.create(&admin, new_user("second")).await.unwrap();

    let patch = UserPatch {
        username: Some("first".into()),
        ..Default::default()
    };
    let err = h.admin.update(&admin, second.id, patch).await.unwrap_err();
    assert!(matches!(err, GatepassError::AlreadyExists { .. }));

    let err = h
        .admin
        .update(&admin, Uuid::new_v4(), UserPatch::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_other_user_succeeds_and_self_delete_is_rejected() {
    let h = setup().await;
    let admin = actor(&h, "admin", Role::Admin).await;
    let target = h.admin.create(&admin, new_user("jdoe")).await.unwrap();

    h.admin.delete(&admin, target.id).await.unwrap();
    assert!(h.users.get_by_id(target.id).await.unwrap_err().is_not_found());

    let err = h.admin.delete(&admin, admin.user.id).await.unwrap_err();
    assert!(matches!(err, GatepassError::SelfDeletion));

    let err = h.admin.delete(&admin, target.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn user_mutations_are_audited() {
    let h = setup().await;
    let admin = actor(&h, "admin", Role::Admin).await;
    let target = h.admin.create(&admin, new_user("jdoe")).await.unwrap();
    h.admin
        .update(
            &admin,
            target.id,
            UserPatch {
                first_name: Some("Janet".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    h.admin.delete(&admin, target.id).await.unwrap();

    let page = h
        .reports
        .activity(&admin.user, ActivityQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    for entry in &page.items {
        assert_eq!(extract_username(&entry.details), Some("jdoe"));
        assert_eq!(entry.source_ip, "unknown");
    }

    let actions = h.reports.activity_actions(&admin.user).await.unwrap();
    assert_eq!(actions, ["create_user", "delete_user", "update_user"]);

    let filtered = h
        .reports
        .activity(
            &admin.user,
            ActivityQuery {
                action: Some("delete_user".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);
}

#[tokio::test]
async fn statistics_require_capability_and_count_users() {
    let h = setup().await;
    let admin = actor(&h, "admin", Role::Admin).await;
    let officer = actor(&h, "officer", Role::SecurityOfficer).await;

    let err = h.reports.statistics(&officer.user).await.unwrap_err();
    assert!(matches!(err, GatepassError::AuthorizationDenied { .. }));

    let stats = h.reports.statistics(&admin.user).await.unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.total_permits, 0);
    assert_eq!(stats.daily_trend.len(), 30);
}

#[tokio::test]
async fn configured_password_minimum_applies_to_admin_writes() {
    let h = setup().await;
    let admin = actor(&h, "root", Role::Admin).await;
    let strict = UserAdminService::new(
        SurrealUserRepository::new(h.db.clone()),
        h.resolver.clone(),
        ActivityAuditor::new(SurrealActivityLogRepository::new(h.db.clone())),
    )
    .with_min_password_length(16);

    // "s3cure-pass" passes the default minimum but not this one.
    let err = strict.create(&admin, new_user("jdoe")).await.unwrap_err();
    assert!(matches!(err, GatepassError::Validation { .. }));

    let mut input = new_user("jdoe");
    input.password = "a-much-longer-passphrase".into();
    let created = strict.create(&admin, input).await.unwrap();

    let patch = UserPatch {
        password: Some("short-pass".into()),
        ..Default::default()
    };
    let err = strict
        .update(&admin, created.id, patch)
        .await
        .unwrap_err();
    assert!(matches!(err, GatepassError::Validation { .. }));
}
