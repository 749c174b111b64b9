use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::TokenCache;
use crate::errors::AppError;

use super::management::lenient_json;

/// Payload delivered to the push service for one contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    #[serde(rename = "contactKey")]
    pub contact_key: String,
    #[serde(rename = "dataFromActivity")]
    pub data_from_activity: Value,
}

/// Raw result of a push call. The client does not judge the status; the
/// execution orchestrator decides what counts as success.
#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub status: u16,
    pub body: Value,
}

impl PushOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers assembled contact payloads to the push service.
pub struct PushClient {
    http: reqwest::Client,
    tokens: Arc<TokenCache>,
    push_url: String,
}

impl PushClient {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenCache>, push_url: String) -> Self {
        Self {
            http,
            tokens,
            push_url,
        }
    }

    /// Authenticated POST of `request` to the push endpoint. Network-level
    /// failures are errors; HTTP-level failures come back in the outcome.
    pub async fn send(&self, request: &PushRequest) -> Result<PushOutcome, AppError> {
        if self.push_url.is_empty() {
            return Err(AppError::ConfigurationMissing("PUSH_API_URL".into()));
        }

        let token = self.tokens.acquire().await?;

        let resp = self
            .http
            .post(&self.push_url)
            .bearer_auth(&token)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnreachable(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(status, contact_key = %request.contact_key, "push call completed");

        Ok(PushOutcome {
            status,
            body: lenient_json(body),
        })
    }
}
