use crate::error::{AppError, AppResult};
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn from_app_error(id: &str, e: &AppError) -> serde_json::Value {
    let details = match e {
        AppError::NotFound { entity } => Some(json!({ "entity": entity })),
        _ => None,
    };
    if e.code() == "internal" {
        tracing::error!(error = %e, "request failed");
    }
    err(id, e.code(), e.to_string(), details)
}

/// Envelope a handler outcome.
pub fn respond(id: &str, result: AppResult<serde_json::Value>) -> serde_json::Value {
    match result {
        Ok(v) => ok(id, v),
        Err(e) => from_app_error(id, &e),
    }
}
