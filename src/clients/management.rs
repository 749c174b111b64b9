use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::TokenCache;
use crate::errors::AppError;

/// One catalog entry as shown to the configuration UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub message: String,
}

// Rowset shape returned by the management API's data endpoint.

#[derive(Debug, Deserialize)]
struct Rowset {
    #[serde(default)]
    items: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    keys: RowKeys,
    #[serde(default)]
    values: RowValues,
}

#[derive(Debug, Default, Deserialize)]
struct RowKeys {
    templateid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RowValues {
    templatename: Option<String>,
    templatemessage: Option<String>,
}

/// Reads the template catalog from the management REST API.
pub struct TemplateClient {
    http: reqwest::Client,
    tokens: Arc<TokenCache>,
    base_url: String,
    de_key: String,
}

impl TemplateClient {
    pub fn new(
        http: reqwest::Client,
        tokens: Arc<TokenCache>,
        base_url: String,
        de_key: String,
    ) -> Self {
        Self {
            http,
            tokens,
            base_url,
            de_key,
        }
    }

    /// Fetch the catalog. An empty backing rowset is an empty `Vec`, not an
    /// error; rows without a template id are skipped.
    pub async fn fetch_catalog(&self) -> Result<Vec<Template>, AppError> {
        if self.base_url.is_empty() {
            return Err(AppError::ConfigurationMissing("MC_REST_BASE_URL".into()));
        }

        let token = self.tokens.acquire().await?;
        let url = format!(
            "{}/data/v1/customobjectdata/key/{}/rowset",
            self.base_url.trim_end_matches('/'),
            self.de_key
        );

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "template catalog fetch failed");
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                body: lenient_json(body),
            });
        }

        let rowset: Rowset = resp
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnreachable(format!("malformed rowset: {e}")))?;

        let templates = rowset
            .items
            .into_iter()
            .filter_map(|row| {
                let Some(id) = row.keys.templateid else {
                    tracing::warn!("skipping catalog row without a templateid key");
                    return None;
                };
                Some(Template {
                    id,
                    name: row.values.templatename.unwrap_or_default(),
                    message: row.values.templatemessage.unwrap_or_default(),
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = templates.len(), "fetched template catalog");
        Ok(templates)
    }
}

/// Parse an upstream body as JSON when possible, else carry it as a string.
pub(crate) fn lenient_json(body: String) -> serde_json::Value {
    serde_json::from_str(&body).unwrap_or(serde_json::Value::String(body))
}
