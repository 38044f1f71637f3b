use crate::auth::{password, reset, Identity, RequestContext};
use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::helpers::{conn, get_str};
use crate::ipc::types::{AppState, Request};
use crate::repo::{students, users};
use serde_json::json;

fn handle_admin_login(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let username = get_str(&req.params, "username")?;
    let pass = get_str(&req.params, "password")?;

    let Some(user) = users::verify_login(conn, username, pass)? else {
        tracing::warn!(username = %username.trim(), "admin login failed");
        return Err(AppError::Unauthorized("invalid username or password".to_string()));
    };
    let session = state.sessions.open(Identity::Admin {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role,
    });
    tracing::info!(username = %user.username, role = user.role.as_str(), "admin logged in");
    Ok(json!({ "session": session, "user": user }))
}

fn handle_student_login(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let reg_no = get_str(&req.params, "regNo")?;
    let pass = get_str(&req.params, "password")?;

    let Some(student) = students::verify_login(conn, reg_no, pass)? else {
        tracing::warn!(reg_no = %reg_no.trim(), "student login failed");
        return Err(AppError::Unauthorized(
            "invalid registration number or password".to_string(),
        ));
    };
    let session = state.sessions.open(Identity::Student {
        student_id: student.id,
    });
    tracing::info!(student_id = student.id, "student logged in");
    Ok(json!({ "session": session, "studentId": student.id, "student": student }))
}

fn handle_logout(state: &mut AppState, ctx: &RequestContext) -> AppResult<serde_json::Value> {
    let Some(token) = ctx.session.as_deref() else {
        return Err(AppError::Unauthorized("not logged in".to_string()));
    };
    if !state.sessions.close(token) {
        return Err(AppError::Unauthorized("not logged in".to_string()));
    }
    Ok(json!({ "loggedOut": true }))
}

fn handle_whoami(ctx: &RequestContext) -> AppResult<serde_json::Value> {
    Ok(json!({ "identity": ctx.identity }))
}

/// The token is handed back to the caller, who is responsible for getting
/// it to the student.
fn handle_reset_request(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let reg_no = get_str(&req.params, "regNo")?;
    let student = students::get_by_reg_no(conn, reg_no)?.ok_or(AppError::not_found("student"))?;
    let token = reset::issue_reset_token(
        student.id,
        &state.config.secret,
        state.config.reset_ttl_secs,
    )?;
    tracing::info!(student_id = student.id, "password reset requested");
    Ok(json!({
        "token": token,
        "studentId": student.id,
        "expiresInSecs": state.config.reset_ttl_secs
    }))
}

fn handle_reset_password(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let token = get_str(&req.params, "token")?;
    let new_password = get_str(&req.params, "password")?;

    let student_id = reset::verify_reset_token(token, &state.config.secret)?;
    password::validate_reset_password(new_password)?;
    students::set_password(conn, student_id, new_password, state.config.hash_cost)?;
    state.sessions.revoke_student(student_id);
    tracing::info!(student_id, "student password reset");
    Ok(json!({ "studentId": student_id, "reset": true }))
}

pub fn try_handle(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "auth.adminLogin" => handle_admin_login(state, req),
        "auth.studentLogin" => handle_student_login(state, req),
        "auth.logout" => handle_logout(state, ctx),
        "auth.whoami" => handle_whoami(ctx),
        "auth.resetRequest" => handle_reset_request(state, req),
        "auth.resetPassword" => handle_reset_password(state, req),
        _ => return None,
    };
    Some(respond(&req.id, result))
}
