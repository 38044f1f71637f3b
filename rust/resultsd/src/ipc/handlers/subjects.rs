use crate::auth::{require_admin, RequestContext};
use crate::error::AppResult;
use crate::ipc::error::respond;
use crate::ipc::helpers::{conn, get_i64, get_str, opt_i64, with_tx};
use crate::ipc::types::{AppState, Request};
use crate::repo::subjects;
use serde_json::json;

fn handle_subjects_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let subjects = subjects::list(conn, opt_i64(&req.params, "classId")?)?;
    Ok(json!({ "subjects": subjects }))
}

fn handle_subjects_create(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let name = get_str(&req.params, "name")?;
    let class_id = get_i64(&req.params, "classId")?;
    let subject = subjects::create(conn, name, class_id)?;
    Ok(json!({ "subject": subject }))
}

fn handle_subjects_delete(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let subject_id = get_i64(&req.params, "subjectId")?;
    let results_deleted = with_tx(conn, |tx| subjects::delete(tx, subject_id))?;
    Ok(json!({ "subjectId": subject_id, "resultsDeleted": results_deleted }))
}

pub fn try_handle(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> Option<serde_json::Value> {
    let handler: fn(&mut AppState, &Request) -> AppResult<serde_json::Value> =
        match req.method.as_str() {
            "subjects.list" => handle_subjects_list,
            "subjects.create" => handle_subjects_create,
            "subjects.delete" => handle_subjects_delete,
            _ => return None,
        };
    let result = require_admin(ctx).and_then(|_| handler(state, req));
    Some(respond(&req.id, result))
}
