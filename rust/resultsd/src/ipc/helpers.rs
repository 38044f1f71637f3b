use crate::error::{AppError, AppResult};
use rusqlite::Connection;
use serde_json::Value;
use std::path::PathBuf;

pub fn conn(db: &Option<Connection>) -> AppResult<&Connection> {
    db.as_ref().ok_or(AppError::NoWorkspace)
}

pub fn get_str<'a>(params: &'a Value, key: &str) -> AppResult<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::validation(format!("missing params.{key}")))
}

pub fn opt_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

pub fn get_i64(params: &Value, key: &str) -> AppResult<i64> {
    opt_i64(params, key)?.ok_or_else(|| AppError::validation(format!("missing params.{key}")))
}

/// Accepts JSON numbers and numeric strings; `null` counts as absent.
pub fn opt_i64(params: &Value, key: &str) -> AppResult<Option<i64>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| AppError::validation(format!("params.{key} must be an integer"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::validation(format!("params.{key} must be an integer"))),
        Some(_) => Err(AppError::validation(format!(
            "params.{key} must be an integer"
        ))),
    }
}

pub fn get_path(params: &Value, key: &str) -> AppResult<PathBuf> {
    get_str(params, key).map(PathBuf::from)
}

/// Run `f` inside a transaction; an error rolls everything back.
pub fn with_tx<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> AppResult<T>,
) -> AppResult<T> {
    let tx = conn.unchecked_transaction()?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}
