use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::binding::{personalize, resolve};
use crate::clients::{PushClient, PushRequest};
use crate::errors::AppError;

/// Body returned to the journey platform on a successful execution.
#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub status: &'static str,
    pub result: Value,
}

/// Everything needed for the outbound push payload, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedActivity {
    pub contact_key: String,
    pub phone: String,
    pub message: String,
    pub from: Option<String>,
    pub de_field_value: Option<String>,
    pub custom_text: Option<String>,
    pub template_id: Option<String>,
}

impl ResolvedActivity {
    pub fn into_push_request(self) -> PushRequest {
        let mut data = Map::new();
        data.insert("phone".into(), json!(self.phone));
        data.insert("message".into(), json!(self.message));
        if let Some(from) = self.from {
            data.insert("from".into(), json!(from));
        }
        if let Some(value) = self.de_field_value {
            data.insert("deFieldValue".into(), json!(value));
        }
        if let Some(text) = self.custom_text {
            data.insert("customText".into(), json!(text));
        }
        if let Some(id) = self.template_id {
            data.insert("selectedTemplateId".into(), json!(id));
        }
        PushRequest {
            contact_key: self.contact_key,
            data_from_activity: Value::Object(data),
        }
    }
}

/// Run one activity execution end to end. Each invocation is single-shot
/// and stateless; concurrent executions only meet inside the token caches.
pub async fn execute(payload: &Value, push: &PushClient) -> Result<ExecuteResponse, AppError> {
    let resolved = resolve_activity(payload)?;
    let contact_key = resolved.contact_key.clone();

    let outcome = push.send(&resolved.into_push_request()).await?;
    if outcome.is_success() {
        tracing::info!(contact_key = %contact_key, status = outcome.status, "push delivered");
        Ok(ExecuteResponse {
            status: "ok",
            result: outcome.body,
        })
    } else {
        tracing::warn!(
            contact_key = %contact_key,
            status = outcome.status,
            body = %outcome.body,
            "push rejected by upstream"
        );
        Err(AppError::UpstreamStatus {
            status: outcome.status,
            body: outcome.body,
        })
    }
}

/// Extract and resolve the configured fields from a decoded journey
/// payload. Required fields (`phone`, the message) are rejected up front:
/// a missing binding is a configuration problem, a binding that resolves
/// to nothing is a data problem, and neither is silently forwarded empty.
pub fn resolve_activity(payload: &Value) -> Result<ResolvedActivity, AppError> {
    if !payload.is_object() {
        return Err(AppError::BadPayload("payload must be a JSON object".into()));
    }

    let contact_key = payload
        .get("keyValue")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::BadPayload("payload is missing 'keyValue'".into()))?
        .to_string();

    let args = merged_in_arguments(payload);

    let phone = match arg(&args, "phone") {
        None => return Err(AppError::MissingConfiguration { field: "phone" }),
        Some(binding) => {
            resolve(binding, payload).ok_or(AppError::MissingData { field: "phone" })?
        }
    };

    let message_binding = arg(&args, "message");
    let template_message = arg(&args, "selectedTemplateMessage");

    let personalized = template_message
        .map(|template| personalize(template, payload))
        .filter(|text| !text.trim().is_empty());
    let resolved_override = message_binding.and_then(|binding| resolve(binding, payload));

    let message = match personalized.or(resolved_override) {
        Some(message) => message,
        None if message_binding.is_none() && template_message.is_none() => {
            return Err(AppError::MissingConfiguration { field: "message" });
        }
        None => return Err(AppError::MissingData { field: "message" }),
    };

    Ok(ResolvedActivity {
        contact_key,
        phone,
        message,
        from: arg(&args, "from").and_then(|binding| resolve(binding, payload)),
        de_field_value: arg(&args, "selectedDEField").and_then(|binding| resolve(binding, payload)),
        custom_text: arg(&args, "customText").map(str::to_string),
        template_id: arg(&args, "selectedTemplateId").map(str::to_string),
    })
}

/// The platform delivers the configuration as an array of one-key objects;
/// merge them left to right into a single map.
fn merged_in_arguments(payload: &Value) -> Map<String, Value> {
    let mut merged = Map::new();
    if let Some(items) = payload.get("inArguments").and_then(Value::as_array) {
        for item in items {
            if let Value::Object(map) = item {
                for (key, value) in map {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
    }
    merged
}

fn arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
