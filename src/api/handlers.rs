use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::activity::{self, ExecuteResponse};
use crate::clients::Template;
use crate::errors::AppError;
use crate::AppState;

/// Execute the activity for one contact. The HTTP layer hands us an
/// already-decoded journey payload; signature verification happens before
/// this point.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<ExecuteResponse>, AppError> {
    let response = activity::execute(&payload, &state.push).await?;
    Ok(Json(response))
}

/// Template catalog for the configuration UI.
pub async fn templates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Template>>, AppError> {
    let catalog = state.templates.fetch_catalog().await?;
    Ok(Json(catalog))
}

// Lifecycle endpoints. The journey platform calls these when an activity is
// saved, validated, published or stopped and only needs a 200 back; the
// configuration itself travels inside the execute payload.

pub async fn save(Json(payload): Json<Value>) -> Json<Value> {
    lifecycle("save", &payload)
}

pub async fn validate(Json(payload): Json<Value>) -> Json<Value> {
    lifecycle("validate", &payload)
}

pub async fn publish(Json(payload): Json<Value>) -> Json<Value> {
    lifecycle("publish", &payload)
}

pub async fn stop(Json(payload): Json<Value>) -> Json<Value> {
    lifecycle("stop", &payload)
}

fn lifecycle(event: &str, payload: &Value) -> Json<Value> {
    let activity_id = payload
        .get("activityObjectID")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    tracing::debug!(event, activity_id, "lifecycle notification");
    Json(json!({ "status": "ok" }))
}
