mod common;

use common::TestApp;
use serde_json::json;
use std::sync::Arc;
use tarot_backend::domain::models::{project::Project, user::User};
use tarot_backend::domain::ports::{ProjectRepository, UserRepository};
use tarot_backend::domain::services::ledger::EntitlementLedger;
use tarot_backend::error::AppError;
use tokio::task::JoinSet;

#[tokio::test]
async fn test_concurrent_draws_never_overspend() {
    let app = TestApp::new().await;
    let (_, spread_id, user_id) = app.seed_reading(1).await;
    let body = json!({ "user": user_id, "spread": spread_id });

    let (first, second) = tokio::join!(
        app.post("/readings/cards", body.clone()),
        app.post("/readings/cards", body.clone()),
    );

    let mut statuses = vec![first.0.as_u16(), second.0.as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![200, 400], "first: {}, second: {}", first.1, second.1);
    assert_eq!(app.balance(&user_id).await, 0);

    let (_, history) = app.get(&format!("/users/{}/interpretations", user_id)).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ledger_debit_race() {
    let app = TestApp::new().await;
    let project_id = app.create_project("Mystic Tarot").await;
    let user_id = app.create_user(&project_id, 77, 3).await;

    let mut tasks = JoinSet::new();
    for _ in 0..6 {
        let state = app.state.clone();
        let user_id = user_id.clone();
        tasks.spawn(async move { state.ledger.debit(&user_id).await });
    }
    let results = tasks.join_all().await;

    let succeeded: Vec<i64> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    let rejected = results.iter()
        .filter(|r| matches!(r, Err(AppError::InsufficientBalance)))
        .count();

    assert_eq!(succeeded.len(), 3);
    assert_eq!(rejected, 3);
    let mut remaining = succeeded.clone();
    remaining.sort();
    assert_eq!(remaining, vec![0, 1, 2]);
    assert_eq!(app.balance(&user_id).await, 0);

    let err = app.state.ledger.debit("ghost").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_grant_rejects_non_positive_amounts() {
    let app = TestApp::new().await;
    let project_id = app.create_project("Mystic Tarot").await;
    let user_id = app.create_user(&project_id, 78, 1).await;

    let (status, body) = app.post(&format!("/users/{}/grant", user_id), json!({ "readings": 4 })).await;
    assert_eq!(status.as_u16(), 200, "{}", body);
    assert_eq!(body["balance"], 5);

    let (status, _) = app.post(&format!("/users/{}/grant", user_id), json!({ "readings": 0 })).await;
    assert_eq!(status.as_u16(), 400);

    let (status, _) = app.post(&format!("/users/{}/grant", user_id), json!({ "readings": i64::MAX })).await;
    assert_eq!(status.as_u16(), 400);
    assert_eq!(app.balance(&user_id).await, 5);
}

#[tokio::test]
async fn test_postgres_debit_race() {
    let db_url = std::env::var("DATABASE_URL").unwrap_or_default();
    if !db_url.starts_with("postgres") {
        println!("Skipping concurrency test (not targeting Postgres)");
        return;
    }

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(20)
        .connect(&db_url)
        .await
        .expect("Failed to connect to DB");
    tarot_backend::infra::factory::run_postgres_migrations(&pool).await;

    let repos = tarot_backend::infra::factory::postgres_repositories(pool.clone());
    let project = repos.projects
        .create(&Project::new("Race".into(), format!("{}:race", uuid::Uuid::new_v4().as_u128() % 1_000_000)))
        .await
        .unwrap();
    let user = repos.users
        .create(&User::new(project.id.clone(), 1, None, 10))
        .await
        .unwrap();

    let ledger = Arc::new(EntitlementLedger::new(repos.users.clone()));
    let mut tasks = JoinSet::new();
    for _ in 0..25 {
        let ledger = ledger.clone();
        let user_id = user.id.clone();
        tasks.spawn(async move { ledger.debit(&user_id).await });
    }
    let results = tasks.join_all().await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 10);
    assert_eq!(repos.users.find_by_id(&user.id).await.unwrap().unwrap().balance, 0);
}
