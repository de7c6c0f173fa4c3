//! Runs against a live Postgres pointed to by `APP_DATABASE_URL`.
//! `cargo test -- --ignored` to include them.

use gardenfab_backend::{
    db::postgres::{create_pool, run_migrations},
    entities::lead::{LeadInsert, LeadStatus, NewLeadRequest},
    errors::AppError,
    repositories::{lead::LeadRepository, sqlx_repo::SqlxLeadRepo},
};
use uuid::Uuid;
use validator::Validate;

async fn repo() -> SqlxLeadRepo {
    dotenv::dotenv().ok();
    let url = std::env::var("APP_DATABASE_URL").expect("APP_DATABASE_URL must be set");
    let pool = create_pool(&url, 2).await.expect("Failed to connect to Postgres");
    run_migrations(&pool).await.expect("Failed to run migrations");
    SqlxLeadRepo::new(pool)
}

fn insert(name: &str) -> LeadInsert {
    LeadInsert {
        name: name.to_string(),
        phone: "+7 999 123 45 67".to_string(),
        message: None,
    }
}

#[actix_rt::test]
#[ignore]
async fn create_then_fetch_round_trips_defaults() {
    let repo = repo().await;

    let created = repo.create_lead(&insert("Repo Test")).await.unwrap();
    assert_eq!(created.status, LeadStatus::New);
    assert_eq!(created.created_at, created.updated_at);

    let fetched = repo.get_lead_by_id(&created.id).await.unwrap();
    assert_eq!(fetched.name, "Repo Test");
    assert!(fetched.message.is_none());

    repo.delete_lead(&created.id).await.unwrap();
}

#[actix_rt::test]
#[ignore]
async fn longest_accepted_phone_is_stored() {
    let repo = repo().await;

    let request = NewLeadRequest {
        name: "Long Phone".to_string(),
        phone: "+12345678901234567890".to_string(),
        message: None,
    };
    assert_eq!(request.phone.chars().count(), 21);
    request.validate().unwrap();

    let created = repo.create_lead(&LeadInsert::from(request)).await.unwrap();
    assert_eq!(created.phone, "+12345678901234567890");

    repo.delete_lead(&created.id).await.unwrap();
}

#[actix_rt::test]
#[ignore]
async fn update_status_bumps_updated_at() {
    let repo = repo().await;
    let created = repo.create_lead(&insert("Status Test")).await.unwrap();

    let updated = repo
        .update_lead_status(&created.id, LeadStatus::Completed)
        .await
        .unwrap();
    assert_eq!(updated.status, LeadStatus::Completed);
    assert!(updated.updated_at >= created.updated_at);

    let completed = repo.list_leads(Some(LeadStatus::Completed)).await.unwrap();
    assert!(completed.iter().any(|l| l.id == created.id));

    repo.delete_lead(&created.id).await.unwrap();
}

#[actix_rt::test]
#[ignore]
async fn missing_rows_are_not_found() {
    let repo = repo().await;
    let id = Uuid::new_v4();

    assert!(matches!(repo.get_lead_by_id(&id).await, Err(AppError::NotFound(_))));
    assert!(matches!(
        repo.update_lead_status(&id, LeadStatus::Contacted).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(repo.delete_lead(&id).await, Err(AppError::NotFound(_))));
}

#[actix_rt::test]
#[ignore]
async fn connection_check_succeeds() {
    let repo = repo().await;
    assert!(repo.check_connection().await.is_ok());
    assert!(repo.count_leads_by_status().await.is_ok());
}
