//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `grantdesk_test`)
//!   `TEST_DB_PASSWORD` (default: `grantdesk_test`)
//!   `TEST_DB_NAME` (default: `grantdesk_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use grantdesk_db::entities::{
    enrollment::{self, EnrollmentStatus},
    profile::Role,
    project, report, sub_project,
};
use grantdesk_db::repositories::{
    DeleteOutcome, EnrollmentRepository, ProfileRepository, ReportRepository,
};
use grantdesk_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

/// Open a second connection to the test database. `DatabaseConnection` is not
/// `Clone` when sea-orm's `mock` feature is enabled (as it is for dev builds).
async fn shared_connection(db: &TestDatabase) -> sea_orm::DatabaseConnection {
    sea_orm::Database::connect(&db.config.database_url())
        .await
        .expect("Failed to connect")
}

async fn seed_enrollment(db: &TestDatabase, user_id: &str) {
    let conn = db.connection();
    project::ActiveModel {
        id: Set(format!("p-{user_id}")),
        title: Set("Soil microbiome".to_string()),
        organization_name: Set("Agency".to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .unwrap();
    sub_project::ActiveModel {
        id: Set(format!("sp-{user_id}")),
        project_id: Set(format!("p-{user_id}")),
        title: Set("Sampling".to_string()),
        monthly_amount_cents: Set(70_000),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .unwrap();
    enrollment::ActiveModel {
        id: Set(format!("e-{user_id}")),
        user_id: Set(user_id.to_string()),
        sub_project_id: Set(format!("sp-{user_id}")),
        status: Set(EnrollmentStatus::Active),
        start_month: Set(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
        end_month: Set(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()),
        monthly_amount_cents: Set(70_000),
        created_at: Set(Utc::now().into()),
        updated_at: Set(None),
    }
    .insert(conn)
    .await
    .unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_delete_if_unreferenced_round_trip() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    db.seed_profile("free", "Free Scholar", "52998224725", Role::Scholar)
        .await
        .unwrap();
    db.seed_profile("bound", "Bound Scholar", "11144477735", Role::Scholar)
        .await
        .unwrap();
    seed_enrollment(&db, "bound").await;

    let repo = ProfileRepository::new(Arc::new(shared_connection(&db).await));

    assert_eq!(
        repo.delete_if_unreferenced("free").await.unwrap(),
        DeleteOutcome::Deleted
    );
    assert!(matches!(
        repo.delete_if_unreferenced("bound").await.unwrap(),
        DeleteOutcome::HasDependencies(d) if d.enrollments == 1
    ));
    assert_eq!(
        repo.delete_if_unreferenced("free").await.unwrap(),
        DeleteOutcome::NotFound
    );

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_deactivate_suspends_active_enrollment() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    db.seed_profile("bound", "Bound Scholar", "11144477735", Role::Scholar)
        .await
        .unwrap();
    seed_enrollment(&db, "bound").await;

    let conn = Arc::new(shared_connection(&db).await);
    let profiles = ProfileRepository::new(Arc::clone(&conn));
    let enrollments = EnrollmentRepository::new(Arc::clone(&conn));

    assert!(profiles.deactivate("bound").await.unwrap());
    assert!(!profiles.get_by_id("bound").await.unwrap().is_active);
    assert!(enrollments.find_active_by_user("bound").await.unwrap().is_none());

    let stored = enrollment::Entity::find_by_id("e-bound")
        .one(db.connection())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, EnrollmentStatus::Suspended);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_dependency_queries_return_subsets() {
    let db = TestDatabase::create_unique().await.expect("Failed to connect");
    db.seed_profile("a", "A", "52998224725", Role::Scholar)
        .await
        .unwrap();
    db.seed_profile("b", "B", "11144477735", Role::Scholar)
        .await
        .unwrap();
    seed_enrollment(&db, "b").await;
    report::ActiveModel {
        id: Set("r1".to_string()),
        user_id: Set("b".to_string()),
        enrollment_id: Set("e-b".to_string()),
        reference_month: Set(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()),
        content: Set("February progress".to_string()),
        submitted_at: Set(Utc::now().into()),
    }
    .insert(db.connection())
    .await
    .unwrap();

    let conn = Arc::new(shared_connection(&db).await);
    let ids = vec!["a".to_string(), "b".to_string()];

    let enrolled = EnrollmentRepository::new(Arc::clone(&conn))
        .find_user_ids_with_enrollments(&ids)
        .await
        .unwrap();
    let reported = ReportRepository::new(Arc::clone(&conn))
        .find_user_ids_with_reports(&ids)
        .await
        .unwrap();

    assert_eq!(enrolled, vec!["b".to_string()]);
    assert_eq!(reported, vec!["b".to_string()]);

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}
