use crate::auth::{require_admin, RequestContext};
use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::helpers::{conn, get_i64, opt_str, with_tx};
use crate::ipc::types::{AppState, Request};
use crate::transfer;
use serde_json::json;
use std::path::Path;

/// CSV text comes inline as `csv` or from a file named by `inPath`.
fn csv_input(params: &serde_json::Value) -> AppResult<String> {
    if let Some(text) = opt_str(params, "csv") {
        return Ok(text.to_string());
    }
    let Some(in_path) = opt_str(params, "inPath") else {
        return Err(AppError::validation("missing params.csv or params.inPath"));
    };
    Ok(std::fs::read_to_string(in_path)?)
}

/// Writes the export to `outPath` when given; the text is returned either way.
fn csv_output(params: &serde_json::Value, text: &str) -> AppResult<Option<String>> {
    let Some(out_path) = opt_str(params, "outPath") else {
        return Ok(None);
    };
    if let Some(parent) = Path::new(out_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(out_path, text)?;
    Ok(Some(out_path.to_string()))
}

fn handle_export_students(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let (text, rows) = transfer::export_students(conn)?;
    let out_path = csv_output(&req.params, &text)?;
    Ok(json!({ "csv": text, "rowsExported": rows, "outPath": out_path }))
}

fn handle_import_students(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let text = csv_input(&req.params)?;
    let cost = state.config.hash_cost;
    let summary = with_tx(conn, |tx| transfer::import_students(tx, &text, cost))?;
    Ok(json!(summary))
}

fn handle_export_results(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let class_id = get_i64(&req.params, "classId")?;
    let (text, rows) = transfer::export_results(conn, class_id)?;
    let out_path = csv_output(&req.params, &text)?;
    Ok(json!({ "csv": text, "rowsExported": rows, "outPath": out_path }))
}

fn handle_import_results(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let class_id = get_i64(&req.params, "classId")?;
    let text = csv_input(&req.params)?;
    let summary = with_tx(conn, |tx| transfer::import_results(tx, class_id, &text))?;
    Ok(json!(summary))
}

pub fn try_handle(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> Option<serde_json::Value> {
    let handler: fn(&mut AppState, &Request) -> AppResult<serde_json::Value> =
        match req.method.as_str() {
            "transfer.exportStudents" => handle_export_students,
            "transfer.importStudents" => handle_import_students,
            "transfer.exportResults" => handle_export_results,
            "transfer.importResults" => handle_import_results,
            _ => return None,
        };
    let result = require_admin(ctx).and_then(|_| handler(state, req));
    Some(respond(&req.id, result))
}
