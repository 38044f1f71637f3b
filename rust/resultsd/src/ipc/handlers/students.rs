use crate::auth::{require_admin, RequestContext};
use crate::error::AppResult;
use crate::ipc::error::respond;
use crate::ipc::helpers::{conn, get_i64, get_str, opt_i64, opt_str, with_tx};
use crate::ipc::types::{AppState, Request};
use crate::repo::students::{self, NewStudent, StudentPatch, DEFAULT_PER_PAGE};
use serde_json::json;

fn handle_students_list(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let page = students::search(
        conn,
        opt_str(&req.params, "q"),
        opt_i64(&req.params, "classId")?,
        opt_i64(&req.params, "page")?.unwrap_or(1),
        opt_i64(&req.params, "perPage")?.unwrap_or(DEFAULT_PER_PAGE),
    )?;
    Ok(json!(page))
}

fn handle_students_create(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let input = NewStudent {
        reg_no: get_str(&req.params, "regNo")?.to_string(),
        name: get_str(&req.params, "name")?.to_string(),
        email: opt_str(&req.params, "email").map(str::to_string),
        class_id: get_i64(&req.params, "classId")?,
        password: get_str(&req.params, "password")?.to_string(),
    };
    let student = students::create(conn, &input, state.config.hash_cost)?;
    Ok(json!({ "student": student }))
}

fn handle_students_update(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let student_id = get_i64(&req.params, "studentId")?;
    let patch = StudentPatch {
        name: opt_str(&req.params, "name").map(str::to_string),
        email: opt_str(&req.params, "email").map(str::to_string),
        class_id: opt_i64(&req.params, "classId")?,
    };
    let student = students::update(conn, student_id, &patch)?;
    Ok(json!({ "student": student }))
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let student_id = get_i64(&req.params, "studentId")?;
    let results_deleted = with_tx(conn, |tx| students::delete(tx, student_id))?;
    state.sessions.revoke_student(student_id);
    Ok(json!({ "studentId": student_id, "resultsDeleted": results_deleted }))
}

pub fn try_handle(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> Option<serde_json::Value> {
    let handler: fn(&mut AppState, &Request) -> AppResult<serde_json::Value> =
        match req.method.as_str() {
            "students.list" => handle_students_list,
            "students.create" => handle_students_create,
            "students.update" => handle_students_update,
            "students.delete" => handle_students_delete,
            _ => return None,
        };
    let result = require_admin(ctx).and_then(|_| handler(state, req));
    Some(respond(&req.id, result))
}
