use crate::auth::{require_admin, RequestContext};
use crate::error::{AppError, AppResult};
use crate::grading::compute_totals;
use crate::ipc::error::respond;
use crate::ipc::helpers::{conn, get_i64, opt_i64};
use crate::ipc::types::{AppState, Request};
use crate::repo::results::{self, ResultRow, DEFAULT_MAX_MARKS};
use crate::repo::{classes, students};
use serde_json::json;

/// `studentId` wins over `classId`; a student listing carries totals.
fn handle_results_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    if let Some(student_id) = opt_i64(&req.params, "studentId")? {
        students::get(conn, student_id)?;
        let rows = results::list_for_student(conn, student_id)?;
        let totals = compute_totals(rows.iter().map(ResultRow::mark_pair));
        return Ok(json!({ "results": rows, "totals": totals }));
    }
    let Some(class_id) = opt_i64(&req.params, "classId")? else {
        return Err(AppError::validation("missing params.classId or params.studentId"));
    };
    classes::get(conn, class_id)?;
    let rows = results::list_for_class(conn, class_id)?;
    Ok(json!({ "results": rows }))
}

fn handle_results_upsert(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let student_id = get_i64(&req.params, "studentId")?;
    let subject_id = get_i64(&req.params, "subjectId")?;
    let marks = get_i64(&req.params, "marks")?;
    let max_marks = opt_i64(&req.params, "maxMarks")?.unwrap_or(DEFAULT_MAX_MARKS);
    let outcome = results::upsert(conn, student_id, subject_id, marks, max_marks)?;
    Ok(json!({ "outcome": outcome }))
}

fn handle_results_delete(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let result_id = get_i64(&req.params, "resultId")?;
    let removed = results::get(conn, result_id)?;
    results::delete(conn, result_id)?;
    Ok(json!({ "resultId": result_id, "removed": removed }))
}

pub fn try_handle(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> Option<serde_json::Value> {
    let handler: fn(&mut AppState, &Request) -> AppResult<serde_json::Value> =
        match req.method.as_str() {
            "results.list" => handle_results_list,
            "results.upsert" => handle_results_upsert,
            "results.delete" => handle_results_delete,
            _ => return None,
        };
    let result = require_admin(ctx).and_then(|_| handler(state, req));
    Some(respond(&req.id, result))
}
