//! Client-credentials token fetcher used by both external APIs.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::ApiCredentials;

use super::{IssuedToken, TokenError, TokenFetcher};

/// POSTs a `client_credentials` grant to the configured auth endpoint.
///
/// Credentials are optional: an unconfigured API surfaces a
/// `ConfigurationMissing` error at call time instead of failing startup.
pub struct ClientCredentialsFetcher {
    http: reqwest::Client,
    credentials: Option<ApiCredentials>,
    api_name: &'static str,
}

/// Both fields are required; either one missing means the response is
/// malformed and the token must not be cached.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

impl ClientCredentialsFetcher {
    pub fn new(
        http: reqwest::Client,
        credentials: Option<ApiCredentials>,
        api_name: &'static str,
    ) -> Self {
        Self {
            http,
            credentials,
            api_name,
        }
    }
}

#[async_trait]
impl TokenFetcher for ClientCredentialsFetcher {
    async fn fetch(&self) -> Result<IssuedToken, TokenError> {
        let creds = self.credentials.as_ref().ok_or_else(|| {
            TokenError::ConfigurationMissing(format!("{} API credentials", self.api_name))
        })?;

        tracing::debug!(api = self.api_name, url = %creds.auth_url, "requesting access token");

        let resp = self
            .http
            .post(&creds.auth_url)
            .json(&json!({
                "grant_type": "client_credentials",
                "client_id": creds.client_id,
                "client_secret": creds.client_secret,
            }))
            .send()
            .await
            .map_err(|e| {
                TokenError::AcquisitionFailed(format!(
                    "{} token endpoint unreachable: {e}",
                    self.api_name
                ))
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TokenError::AcquisitionFailed(format!(
                "{} token endpoint returned {status}: {body}",
                self.api_name
            )));
        }

        let body: TokenEndpointResponse = resp.json().await.map_err(|e| {
            TokenError::AcquisitionFailed(format!(
                "{} token endpoint returned malformed JSON: {e}",
                self.api_name
            ))
        })?;

        match (body.access_token, body.expires_in) {
            (Some(access_token), Some(expires_in)) => Ok(IssuedToken {
                access_token,
                expires_in,
            }),
            (None, _) => Err(TokenError::AcquisitionFailed(format!(
                "{} token response is missing 'access_token'",
                self.api_name
            ))),
            (_, None) => Err(TokenError::AcquisitionFailed(format!(
                "{} token response is missing 'expires_in'",
                self.api_name
            ))),
        }
    }
}
