use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::TokenError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("required configuration is missing: {0}")]
    ConfigurationMissing(String),

    #[error("token acquisition failed: {0}")]
    TokenAcquisition(String),

    #[error("upstream request failed: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream returned HTTP {status}")]
    UpstreamStatus { status: u16, body: serde_json::Value },

    #[error("activity is not configured with a value for '{field}'")]
    MissingConfiguration { field: &'static str },

    #[error("no data could be resolved for '{field}'")]
    MissingData { field: &'static str },

    #[error("malformed activity payload: {0}")]
    BadPayload(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::ConfigurationMissing(what) => AppError::ConfigurationMissing(what),
            TokenError::AcquisitionFailed(reason) => AppError::TokenAcquisition(reason),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            AppError::ConfigurationMissing(what) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_missing",
                json!({ "missing": what }),
            ),
            AppError::TokenAcquisition(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_acquisition_failed",
                json!({ "reason": reason }),
            ),
            AppError::UpstreamUnreachable(reason) => (
                StatusCode::BAD_GATEWAY,
                "upstream_unreachable",
                json!({ "reason": reason }),
            ),
            AppError::UpstreamStatus { status, body } => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                json!({ "upstream_status": status, "upstream_body": body }),
            ),
            AppError::MissingConfiguration { field } => (
                StatusCode::BAD_REQUEST,
                "missing_configuration",
                json!({ "field": field }),
            ),
            AppError::MissingData { field } => (
                StatusCode::BAD_REQUEST,
                "missing_data",
                json!({ "field": field }),
            ),
            AppError::BadPayload(reason) => (
                StatusCode::BAD_REQUEST,
                "bad_payload",
                json!({ "reason": reason }),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_server_error",
                    json!(null),
                )
            }
        };

        let body = Json(json!({
            "status": "error",
            "message": self.to_string(),
            "details": {
                "code": code,
                "info": details,
            }
        }));

        (status, body).into_response()
    }
}
