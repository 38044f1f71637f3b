use crate::auth::{require_student, RequestContext};
use crate::error::AppResult;
use crate::ipc::error::respond;
use crate::ipc::helpers::{conn, opt_i64};
use crate::ipc::types::{AppState, Request};
use crate::marksheet::MarkSheet;
use serde_json::json;

fn handle_portal_results(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> AppResult<serde_json::Value> {
    let student_id = require_student(ctx, opt_i64(&req.params, "studentId")?)?;
    let conn = conn(&state.db)?;
    let sheet = MarkSheet::build(conn, student_id)?;
    Ok(json!(sheet))
}

fn handle_portal_marksheet(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> AppResult<serde_json::Value> {
    let student_id = require_student(ctx, opt_i64(&req.params, "studentId")?)?;
    let conn = conn(&state.db)?;
    let sheet = MarkSheet::build(conn, student_id)?;
    Ok(json!({
        "classLabel": sheet.class_label(),
        "text": sheet.render_text(),
        "sheet": sheet
    }))
}

pub fn try_handle(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "portal.results" => Some(respond(&req.id, handle_portal_results(state, ctx, req))),
        "portal.marksheet" => Some(respond(&req.id, handle_portal_marksheet(state, ctx, req))),
        _ => None,
    }
}
