use std::time::Duration;

use async_trait::async_trait;
use escrow_core::{Notification, PortError, PrepareFinalizeResult, ReminderContext};
use escrow_types::{Audience, ReminderReason, Suggested};
use reqwest::Client;
use serde_json::json;

const PORT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP-backed [`Notification`] port for the `dialect` driver. `base_url`
/// is validated to end with `/` at config load time (§4.11), so endpoints
/// are built by plain concatenation here.
pub struct DialectNotifier {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl DialectNotifier {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(PORT_TIMEOUT)
                .build()
                .expect("reqwest client builds with static config"),
            base_url: base_url.into(),
            api_key,
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), PortError> {
        let mut request = self.client.post(format!("{}{}", self.base_url, path)).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Transient(e.to_string()))?;
        if response.status().is_server_error() {
            return Err(PortError::Transient(response.status().to_string()));
        }
        if !response.status().is_success() {
            return Err(PortError::Permanent(response.status().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notification for DialectNotifier {
    async fn notify_reviewer(
        &self,
        deal_id: &str,
        suggested: Suggested,
        result: Option<&PrepareFinalizeResult>,
    ) -> Result<(), PortError> {
        self.post(
            "reviewer",
            json!({
                "dealId": deal_id,
                "suggested": suggested.to_string(),
                "approvalUrl": result.and_then(|r| r.approval_url.clone()),
                "blinkUrl": result.and_then(|r| r.blink_url.clone()),
            }),
        )
        .await
    }

    async fn notify_parties(&self, deal_id: &str, event: &str) -> Result<(), PortError> {
        self.post("parties", json!({"dealId": deal_id, "event": event}))
            .await
    }

    async fn send_reminder(
        &self,
        deal_id: &str,
        when: i64,
        audience: Audience,
        reason: ReminderReason,
        context: ReminderContext,
    ) -> Result<(), PortError> {
        self.post(
            "reminder",
            json!({
                "dealId": deal_id,
                "when": when,
                "audience": audience.to_string(),
                "reason": reason.to_string(),
                "context": context,
            }),
        )
        .await
    }
}
