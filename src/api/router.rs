use axum::{
    body::Body,
    extract::Request,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{health, project, user, catalog, package, reading, payment, bot};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Projects
        .route("/projects", post(project::create_project).get(project::list_projects))
        .route("/projects/{project_id}", get(project::get_project))
        .route("/projects/{project_id}/theme", get(project::get_theme))
        .route("/projects/{project_id}/spreads", get(project::list_spreads))
        .route("/projects/{project_id}/packages", get(project::list_packages))
        .route("/projects/{project_id}/send_message", post(bot::send_message))

        // Users & Ledger
        .route("/users", post(user::get_or_create_user))
        .route("/users/{user_id}", get(user::get_user))
        .route("/users/{user_id}/grant", post(user::grant_readings))
        .route("/users/{user_id}/interpretations", get(user::list_interpretations))
        .route("/users/{user_id}/payments", get(user::list_payments))

        // Catalog
        .route("/decks", post(catalog::create_deck))
        .route("/decks/{deck_id}/cards", post(catalog::add_card).get(catalog::list_cards))
        .route("/spreads", post(catalog::create_spread))
        .route("/packages", post(package::create_package))

        // Readings
        .route("/readings", post(reading::create_reading))
        .route("/readings/cards", post(reading::draw_cards))
        .route("/readings/text", post(reading::create_interpretation))

        // Payments
        .route("/payments", post(payment::create_payment))
        .route("/payments/test", post(payment::test_payment))
        .route("/payments/{payment_id}", get(payment::get_payment))
        .route("/payments/{payment_id}/complete", post(payment::complete_payment))
        .route("/payments/{payment_id}/fail", post(payment::fail_payment))
        .route("/payments/{payment_id}/cancel", post(payment::cancel_payment))

        // Bot
        .route("/bot/webhook", post(bot::webhook))
        .route("/bot/active", get(bot::active_bots))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
