//! Integration tests for the Permit repository using in-memory SurrealDB.

use chrono::{NaiveDate, Utc};
use gatepass_core::error::GatepassError;
use gatepass_core::lifecycle::RegionScope;
use gatepass_core::models::permit::{
    ClosePermit, CreatePermit, Material, RequestType, UpdatePermit,
};
use gatepass_core::repository::{PermitFilter, PermitRepository};
use gatepass_db::repository::SurrealPermitRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> SurrealPermitRepository<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    gatepass_db::run_migrations(&db).await.unwrap();
    SurrealPermitRepository::new(db)
}

fn new_permit(number: &str, region: &str, carrier: &str) -> CreatePermit {
    CreatePermit {
        permit_number: number.into(),
        date: NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(),
        region: region.into(),
        location: "North Gate".into(),
        carrier_name: carrier.into(),
        carrier_id: "1010101010".into(),
        request_type: RequestType::MaterialEntrance,
        vehicle_plate: "ABC 1234".into(),
        materials: vec![
            Material {
                id: "1".into(),
                description: "Transformer".into(),
                serial_number: "TX-9".into(),
            },
            Material {
                id: "2".into(),
                description: "Cable drum".into(),
                serial_number: "CD-3".into(),
            },
        ],
        created_by: Uuid::new_v4(),
    }
}

fn closing(by: Uuid) -> ClosePermit {
    ClosePermit {
        closed_by: by,
        closed_by_name: "Sam Guard [sguard]".into(),
        closed_at: Utc::now(),
    }
}

#[tokio::test]
async fn create_then_fetch_round_trips_materials() {
    let repo = setup().await;
    let input = new_permit("MHV0000001", "riyadh", "Acme");
    let created = repo.create(input.clone()).await.unwrap();

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.permit_number, "MHV0000001");
    assert_eq!(fetched.date, input.date);
    assert_eq!(fetched.materials, input.materials);
    assert_eq!(fetched.created_by, input.created_by);
    assert!(fetched.can_reopen);
    assert!(fetched.closed_at.is_none());
    assert!(fetched.closed_by.is_none());

    let by_number = repo.get_by_number("MHV0000001").await.unwrap().unwrap();
    assert_eq!(by_number.id, created.id);
    assert!(repo.get_by_number("ZZZ9").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_number_is_a_conflict() {
    let repo = setup().await;
    repo.create(new_permit("DUP1", "riyadh", "A")).await.unwrap();
    let err = repo
        .create(new_permit("DUP1", "jeddah", "B"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatepassError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn close_is_conditional_on_open() {
    let repo = setup().await;
    let permit = repo.create(new_permit("CLS1", "riyadh", "A")).await.unwrap();
    let closer = Uuid::new_v4();

    let closed = repo.close(permit.id, closing(closer)).await.unwrap().unwrap();
    assert_eq!(closed.closed_by, Some(closer));
    assert_eq!(closed.closed_by_name.as_deref(), Some("Sam Guard [sguard]"));
    assert!(closed.is_closed());

    assert!(repo.close(permit.id, closing(closer)).await.unwrap().is_none());
    assert!(repo.close(Uuid::new_v4(), closing(closer)).await.unwrap().is_none());
}

#[tokio::test]
async fn update_open_skips_closed_permits() {
    let repo = setup().await;
    let permit = repo.create(new_permit("UPD1", "riyadh", "A")).await.unwrap();

    let updated = repo
        .update_open(
            permit.id,
            UpdatePermit {
                location: Some("South Gate".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.location, "South Gate");
    assert_eq!(updated.carrier_name, "A");

    repo.close(permit.id, closing(Uuid::new_v4())).await.unwrap();
    let result = repo
        .update_open(
            permit.id,
            UpdatePermit {
                location: Some("West Gate".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(repo.get_by_id(permit.id).await.unwrap().location, "South Gate");
}

#[tokio::test]
async fn reopen_clears_closed_fields() {
    let repo = setup().await;
    let permit = repo.create(new_permit("RPN1", "riyadh", "A")).await.unwrap();

    assert!(repo.reopen(permit.id).await.unwrap().is_none(), "open permit");

    repo.close(permit.id, closing(Uuid::new_v4())).await.unwrap();
    let reopened = repo.reopen(permit.id).await.unwrap().unwrap();
    assert!(reopened.closed_at.is_none());
    assert!(reopened.closed_by.is_none());
    assert!(reopened.closed_by_name.is_none());
    assert!(reopened.can_reopen);
}

#[tokio::test]
async fn delete_returns_removed_permit() {
    let repo = setup().await;
    let permit = repo.create(new_permit("DEL1", "riyadh", "Acme")).await.unwrap();

    let deleted = repo.delete(permit.id).await.unwrap().unwrap();
    assert_eq!(deleted.carrier_name, "Acme");
    assert!(repo.get_by_id(permit.id).await.unwrap_err().is_not_found());
    assert!(repo.delete(permit.id).await.unwrap().is_none());
}

#[tokio::test]
async fn list_filters_and_orders() {
    let repo = setup().await;
    repo.create(new_permit("AAA1", "riyadh", "Desert Freight")).await.unwrap();
    repo.create(new_permit("BBB2", "jeddah", "Coastal Lines")).await.unwrap();
    let mut third = new_permit("CCC3", "riyadh", "Coastal Lines");
    third.date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    repo.create(third).await.unwrap();

    let all = repo.list(PermitFilter::default()).await.unwrap();
    let numbers: Vec<_> = all.iter().map(|p| p.permit_number.as_str()).collect();
    assert_eq!(numbers, vec!["CCC3", "BBB2", "AAA1"]);

    let scoped = repo
        .list(PermitFilter {
            scope: RegionScope::Only(vec!["jeddah".into()]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].region, "jeddah");

    let searched = repo
        .list(PermitFilter {
            search: Some("coastal".into()),
            region: Some("riyadh".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].permit_number, "CCC3");

    let by_date = repo
        .list(PermitFilter {
            date: NaiveDate::from_ymd_opt(2025, 5, 20),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_date.len(), 2);

    let by_number = repo
        .list(PermitFilter {
            search: Some("bbb".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_number.len(), 1);
}
