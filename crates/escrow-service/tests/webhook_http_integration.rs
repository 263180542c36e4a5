//! HTTP-level integration tests for the webhook intake surface: signature
//! verification, malformed JSON, and the funded-event scheduling scenario
//! from the spec's concrete test scenarios, exercised through the real
//! `axum` router with an in-memory queue substrate standing in for Redis.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use escrow_core::{Api, FinalizeAction, InMemoryQueue, PortError, PrepareFinalizeResult, SchedulingEngine};
use escrow_service::http::{router, AppState};
use escrow_types::{DealSnapshot, DealState, SchedulingPlan};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tower::ServiceExt;

type HmacSha256 = Hmac<Sha256>;

const SECRET: &str = "test-webhook-secret";

struct FakeApi;

#[async_trait]
impl Api for FakeApi {
    async fn get_deal_snapshot(&self, deal_id: &str) -> Result<DealSnapshot, PortError> {
        DealSnapshot::new(deal_id, DealState::Funded, Some(now() + 72 * 3600), None)
            .map_err(|e| PortError::Permanent(e.to_string()))
    }

    async fn prepare_finalize(
        &self,
        _deal_id: &str,
        _action: FinalizeAction,
    ) -> Result<PrepareFinalizeResult, PortError> {
        unreachable!("not exercised by webhook intake tests")
    }
}

fn now() -> i64 {
    // Fixed reference instant; the router only needs `deliveryBy > now`.
    1_700_000_000
}

fn test_app() -> axum::Router {
    let state = AppState {
        engine: Arc::new(SchedulingEngine::new(InMemoryQueue::new())),
        api: Arc::new(FakeApi) as Arc<dyn Api>,
        plan: SchedulingPlan::default(),
        webhook_secret: SECRET.to_string(),
    };
    router(state)
}

fn sign(body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "escrow-service");
}

#[tokio::test]
async fn bad_signature_is_rejected_with_no_side_effects() {
    let app = test_app();
    let body = br#"[{"type":"deal_funded","dealId":"D-1","signature":"sig-1"}]"#.to_vec();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/helius")
                .header("X-Helius-Signature", "0000000000000000000000000000000000000000000000000000000000000000")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["reason"], "signature verification failed");
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = test_app();
    let body = b"not json".to_vec();
    let signature = sign(&body);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/helius")
                .header("X-Helius-Signature", signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["reason"], "malformed json");
}

#[tokio::test]
async fn funded_event_is_accepted_and_scheduled() {
    let app = test_app();
    let body = br#"[{"type":"deal_funded","dealId":"D-1","signature":"sig-1","slot":5,"timestamp":1700000000}]"#.to_vec();
    let signature = sign(&body);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/helius")
                .header("X-Helius-Signature", signature)
                .header("X-Webhook-Id", "wh-1")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["accepted"], 1);
    assert_eq!(json["ignored"], 0);
}
