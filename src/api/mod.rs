use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub mod handlers;

/// Build the activity router.
/// All routes are relative — the caller mounts this under `/activity`.
pub fn activity_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/execute", post(handlers::execute))
        .route("/save", post(handlers::save))
        .route("/validate", post(handlers::validate))
        .route("/publish", post(handlers::publish))
        .route("/stop", post(handlers::stop))
        .route("/templates", get(handlers::templates))
}
