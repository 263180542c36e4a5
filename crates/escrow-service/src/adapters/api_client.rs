use std::time::Duration;

use async_trait::async_trait;
use escrow_core::{Api, FinalizeAction, PortError, PrepareFinalizeResult};
use escrow_types::DealSnapshot;
use reqwest::{Client, StatusCode};
use serde::Serialize;

const PORT_TIMEOUT: Duration = Duration::from_secs(7);

/// HTTP-backed [`Api`] port. Every call is bounded by [`PORT_TIMEOUT`]; a
/// timeout or 5xx is transient (the substrate retries), a 4xx is
/// permanent (retrying a bad request forever is pointless).
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(PORT_TIMEOUT)
                .build()
                .expect("reqwest client builds with static config"),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn classify(status: StatusCode, body: String) -> PortError {
        if status.is_server_error() {
            PortError::Transient(format!("{status}: {body}"))
        } else {
            PortError::Permanent(format!("{status}: {body}"))
        }
    }
}

#[derive(Serialize)]
struct PrepareFinalizeRequest<'a> {
    deal_id: &'a str,
    action: String,
}

#[async_trait]
impl Api for HttpApiClient {
    async fn get_deal_snapshot(&self, deal_id: &str) -> Result<DealSnapshot, PortError> {
        let url = format!("{}/deals/{}", self.base_url, deal_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PortError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify(status, body));
        }

        response
            .json::<DealSnapshot>()
            .await
            .map_err(|e| PortError::Permanent(e.to_string()))
    }

    async fn prepare_finalize(
        &self,
        deal_id: &str,
        action: FinalizeAction,
    ) -> Result<PrepareFinalizeResult, PortError> {
        let url = format!("{}/deals/{}/finalize", self.base_url, deal_id);
        let response = self
            .client
            .post(&url)
            .json(&PrepareFinalizeRequest {
                deal_id,
                action: action.to_string(),
            })
            .send()
            .await
            .map_err(|e| PortError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify(status, body));
        }

        response
            .json::<PrepareFinalizeResult>()
            .await
            .map_err(|e| PortError::Permanent(e.to_string()))
    }
}
