use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use escrow_core::QueueSubstrate;

use crate::error::ServiceError;
use crate::intake::intake;
use crate::router::route_events;

use super::state::AppState;

pub fn router<Q: QueueSubstrate + 'static>(state: AppState<Q>) -> Router {
    Router::new()
        .route("/webhooks/helius", post(webhook_helius::<Q>))
        .route("/health", get(health))
        .with_state(state)
}

async fn webhook_helius<Q: QueueSubstrate>(
    State(state): State<AppState<Q>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ServiceError> {
    let signature = headers
        .get("X-Helius-Signature")
        .and_then(|v| v.to_str().ok());
    let webhook_id = headers.get("X-Webhook-Id").and_then(|v| v.to_str().ok());

    let events = intake(Some(&state.webhook_secret), signature, webhook_id, &body)?;

    let now = chrono::Utc::now().timestamp();
    let outcome = route_events(&events, state.api.as_ref(), &state.engine, &state.plan, now).await;

    Ok(Json(serde_json::json!({
        "ok": true,
        "accepted": outcome.accepted,
        "ignored": outcome.ignored,
    })))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "service": "escrow-service",
        "time": chrono::Utc::now().timestamp(),
    }))
}
