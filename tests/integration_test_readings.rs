mod common;

use axum::http::StatusCode;
use common::{FailingLlmService, RecordingLlmService, TestApp, MOCK_INTERPRETATION};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

fn names(body: &Value) -> Vec<String> {
    body["cards_names"].as_array().unwrap()
        .iter()
        .map(|n| n.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_atomic_reading_consumes_one_credit() {
    let app = TestApp::new().await;
    let (_, spread_id, user_id) = app.seed_reading(1).await;

    let (status, body) = app.post("/readings", json!({
        "user": user_id,
        "spread": spread_id,
        "user_context": "  Will the new job work out?  ",
    })).await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["spread_name"], "Past, Present, Future");
    assert_eq!(body["ai_response"], MOCK_INTERPRETATION);
    assert_eq!(body["ai_service_status"], "generated");
    assert_eq!(body["user_context"], "Will the new job work out?");

    let drawn = names(&body);
    assert_eq!(drawn.len(), 3);
    assert_eq!(drawn.iter().collect::<HashSet<_>>().len(), 3, "cards must be distinct");
    assert_eq!(body["cards_used"].as_array().unwrap().len(), 3);
    assert_eq!(body["cards_images"].as_array().unwrap().len(), 3);

    assert_eq!(app.balance(&user_id).await, 0);

    let (status, history) = app.get(&format!("/users/{}/interpretations", user_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], body["id"]);
}

#[tokio::test]
async fn test_reading_rejected_without_credit() {
    let app = TestApp::new().await;
    let (_, spread_id, user_id) = app.seed_reading(0).await;

    let (status, body) = app.post("/readings", json!({ "user": user_id, "spread": spread_id })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Not enough readings"));
    assert_eq!(app.balance(&user_id).await, 0);

    let (_, history) = app.get(&format!("/users/{}/interpretations", user_id)).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reading_rejected_when_deck_too_small() {
    let app = TestApp::new().await;
    let project_id = app.create_project("Tiny Deck").await;
    app.create_deck(&project_id, 3).await;
    let spread_id = app.create_spread(&project_id, "Celtic Cross", 5).await;
    let user_id = app.create_user(&project_id, 42, 2).await;

    let (status, body) = app.post("/readings", json!({ "user": user_id, "spread": spread_id })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Needed 5, available 3"), "{}", body);
    assert_eq!(app.balance(&user_id).await, 2);
}

#[tokio::test]
async fn test_pool_spans_every_deck_of_the_project() {
    let app = TestApp::new().await;
    let project_id = app.create_project("Two Decks").await;
    app.create_deck(&project_id, 2).await;
    let (status, deck) = app.post("/decks", json!({ "project": project_id, "name": "Minor Arcana" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.post(&format!("/decks/{}/cards", deck["id"].as_str().unwrap()), json!({
        "name": "Ace of Cups",
        "meaning_upright": "New feelings",
        "meaning_reversed": "Blocked emotions",
    })).await;
    assert_eq!(status, StatusCode::CREATED);

    let spread_id = app.create_spread(&project_id, "Three Cards", 3).await;
    let user_id = app.create_user(&project_id, 7, 1).await;

    let (status, body) = app.post("/readings", json!({ "user": user_id, "spread": spread_id })).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(names(&body).contains(&"Ace of Cups".to_string()));
}

#[tokio::test]
async fn test_two_phase_reading_debits_once_and_keeps_orientation() {
    let recorder = Arc::new(RecordingLlmService::default());
    let app = TestApp::with_llm(Some(recorder.clone())).await;
    let (_, spread_id, user_id) = app.seed_reading(2).await;

    let (status, drawn) = app.post("/readings/cards", json!({
        "user_id": user_id,
        "spread_id": spread_id,
        "user_context": "Love life",
    })).await;
    assert_eq!(status, StatusCode::OK, "{}", drawn);
    assert_eq!(drawn["new_balance"], 1);
    assert_eq!(app.balance(&user_id).await, 1);

    let interpretation_id = drawn["interpretation_id"].as_str().unwrap();
    let (status, completed) = app.post("/readings/text", json!({
        "user_id": user_id,
        "spread_id": spread_id,
        "interpretation_id": interpretation_id,
    })).await;

    assert_eq!(status, StatusCode::CREATED, "{}", completed);
    assert_eq!(completed["id"], interpretation_id);
    assert_eq!(completed["cards_used"], drawn["cards_used"]);
    assert_eq!(completed["ai_response"], MOCK_INTERPRETATION);
    assert_eq!(completed["user_context"], "Love life");
    assert_eq!(app.balance(&user_id).await, 1, "second phase must not debit");

    let prompts = recorder.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("CONTEXT FROM THE SEEKER: Love life"));
    for card in drawn["cards_used"].as_array().unwrap() {
        let name = card["name"].as_str().unwrap();
        let index = name.trim_start_matches("Card ");
        let expected = if card["is_reversed"].as_bool().unwrap() {
            format!("{} (reversed) - Reversed meaning {}", name, index)
        } else {
            format!("{} - Upright meaning {}", name, index)
        };
        assert!(prompts[0].contains(&expected), "prompt missing '{}':\n{}", expected, prompts[0]);
    }
}

#[tokio::test]
async fn test_atomic_endpoint_reuses_existing_interpretation() {
    let app = TestApp::new().await;
    let (_, spread_id, user_id) = app.seed_reading(1).await;

    let (_, drawn) = app.post("/readings/cards", json!({ "user": user_id, "spread": spread_id })).await;
    assert_eq!(app.balance(&user_id).await, 0);

    let (status, body) = app.post("/readings", json!({
        "user": user_id,
        "spread": spread_id,
        "interpretation_id": drawn["interpretation_id"],
    })).await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["id"], drawn["interpretation_id"]);
    assert_eq!(body["cards_names"], drawn["cards_names"]);
    assert_eq!(app.balance(&user_id).await, 0);
}

#[tokio::test]
async fn test_second_phase_rejects_mismatched_reading() {
    let app = TestApp::new().await;
    let (project_id, spread_id, user_id) = app.seed_reading(2).await;
    let other_spread = app.create_spread(&project_id, "Yes or No", 1).await;

    let (_, drawn) = app.post("/readings/cards", json!({ "user": user_id, "spread": spread_id })).await;

    let (status, body) = app.post("/readings/text", json!({
        "user": user_id,
        "spread": other_spread,
        "interpretation_id": drawn["interpretation_id"],
    })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Interpretation not found");

    let (status, _) = app.post("/readings/text", json!({
        "user": user_id,
        "spread": spread_id,
        "interpretation_id": "missing",
    })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.post("/readings/text", json!({ "user": user_id, "spread": spread_id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("interpretation_id"));
}

#[tokio::test]
async fn test_reading_lookups_return_not_found() {
    let app = TestApp::new().await;
    let (_, spread_id, user_id) = app.seed_reading(3).await;

    let (status, body) = app.post("/readings", json!({ "user": "nobody", "spread": spread_id })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    let (status, body) = app.post("/readings", json!({ "user": user_id, "spread": "nothing" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Spread not found");

    // A spread that belongs to another project is invisible to this user.
    let foreign_project = app.create_project("Elsewhere").await;
    app.create_deck(&foreign_project, 5).await;
    let foreign_spread = app.create_spread(&foreign_project, "Foreign", 1).await;
    let (status, _) = app.post("/readings", json!({ "user": user_id, "spread": foreign_spread })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(app.balance(&user_id).await, 3);
}

#[tokio::test]
async fn test_missing_fields_are_rejected() {
    let app = TestApp::new().await;
    let (_, spread_id, _) = app.seed_reading(1).await;

    let (status, body) = app.post("/readings", json!({ "spread": spread_id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Field 'user' is required");
}

#[tokio::test]
async fn test_provider_failure_falls_back_to_canned_text() {
    let app = TestApp::with_llm(Some(Arc::new(FailingLlmService))).await;
    let (_, spread_id, user_id) = app.seed_reading(1).await;

    let (status, body) = app.post("/readings", json!({ "user": user_id, "spread": spread_id })).await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["ai_service_status"], "fallback");
    let text = body["ai_response"].as_str().unwrap();
    assert!(text.contains("Past, Present, Future"));
    for name in names(&body) {
        assert!(text.contains(&name), "fallback text should mention {}", name);
    }
    assert_eq!(app.balance(&user_id).await, 0);
}

#[tokio::test]
async fn test_missing_provider_still_answers() {
    let app = TestApp::with_llm(None).await;
    let (_, spread_id, user_id) = app.seed_reading(1).await;

    let (status, body) = app.post("/readings", json!({ "user": user_id, "spread": spread_id })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["ai_service_status"], "fallback");
    assert!(!body["ai_response"].as_str().unwrap().is_empty());
}
