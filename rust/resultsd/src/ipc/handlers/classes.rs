use crate::auth::{require_admin, RequestContext};
use crate::error::AppResult;
use crate::ipc::error::respond;
use crate::ipc::helpers::{conn, get_i64, get_str, opt_str, with_tx};
use crate::ipc::types::{AppState, Request};
use crate::repo::classes;
use serde_json::json;

fn handle_classes_list(state: &mut AppState, _req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    // Counts let the UI show a useful dashboard.
    let classes = classes::list(conn)?;
    Ok(json!({ "classes": classes }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let name = get_str(&req.params, "name")?;
    let section = opt_str(&req.params, "section");
    let class = classes::create(conn, name, section)?;
    Ok(json!({ "class": class }))
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let class_id = get_i64(&req.params, "classId")?;

    // Explicitly delete in dependency order (no ON DELETE CASCADE).
    let removed = with_tx(conn, |tx| classes::delete(tx, class_id))?;
    for student_id in &removed.student_ids {
        state.sessions.revoke_student(*student_id);
    }
    tracing::info!(
        class_id,
        students = removed.student_ids.len(),
        results = removed.results_deleted,
        "class deleted"
    );
    Ok(json!({
        "classId": class_id,
        "studentsDeleted": removed.student_ids.len(),
        "subjectsDeleted": removed.subjects_deleted,
        "resultsDeleted": removed.results_deleted
    }))
}

pub fn try_handle(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> Option<serde_json::Value> {
    let handler: fn(&mut AppState, &Request) -> AppResult<serde_json::Value> =
        match req.method.as_str() {
            "classes.list" => handle_classes_list,
            "classes.create" => handle_classes_create,
            "classes.delete" => handle_classes_delete,
            _ => return None,
        };
    let result = require_admin(ctx).and_then(|_| handler(state, req));
    Some(respond(&req.id, result))
}
