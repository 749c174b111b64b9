//! Push custom-activity backend.
//!
//! A journey orchestrator calls the lifecycle endpoints while an activity
//! is configured and the execute endpoint once per contact. Execution
//! resolves the configured data bindings against the contact's event data,
//! personalizes the message template and forwards the result to the push
//! service, authenticating against each external API through a token cache
//! with single-flight refresh.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod activity;
pub mod api;
pub mod auth;
pub mod binding;
pub mod clients;
pub mod config;
pub mod errors;

use auth::{ClientCredentialsFetcher, TokenCache};
use clients::{PushClient, TemplateClient};

/// Shared application state passed to handlers.
pub struct AppState {
    pub config: config::Config,
    pub templates: TemplateClient,
    pub push: PushClient,
}

impl AppState {
    /// Wire up both clients, each with its own token cache.
    pub fn new(config: config::Config) -> Self {
        let http = clients::http_client();

        let management_tokens = Arc::new(TokenCache::new(Arc::new(
            ClientCredentialsFetcher::new(http.clone(), config.management_auth.clone(), "management"),
        )));
        let push_tokens = Arc::new(TokenCache::new(Arc::new(ClientCredentialsFetcher::new(
            http.clone(),
            config.push_auth.clone(),
            "push",
        ))));

        let templates = TemplateClient::new(
            http.clone(),
            management_tokens,
            config.management_base_url.clone(),
            config.template_de_key.clone(),
        );
        let push = PushClient::new(http, push_tokens, config.push_api_url.clone());

        Self {
            config,
            templates,
            push,
        }
    }
}

/// Assemble the full router with its middleware stack.
pub fn app(state: Arc<AppState>) -> Router {
    let ui_origin = state.config.ui_origin.clone();

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/activity", api::activity_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(ui_origin))
        .layer(axum::middleware::from_fn(request_id_middleware))
}

/// Allow the configuration UI's origin plus localhost for development.
fn cors_layer(ui_origin: String) -> CorsLayer {
    use axum::http::{HeaderName, Method};
    use tower_http::cors::AllowOrigin;

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or("");
            origin_str == ui_origin
                || origin_str.starts_with("http://localhost:")
                || origin_str.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-request-id"),
        ])
}

/// Middleware: injects a unique X-Request-Id into every response.
/// This allows the journey platform to correlate errors with our logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}
