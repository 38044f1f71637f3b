use crate::auth::{require_role, RequestContext, Role};
use crate::error::{AppError, AppResult};
use crate::ipc::error::respond;
use crate::ipc::helpers::{conn, get_i64, get_str, opt_str};
use crate::ipc::types::{AppState, Request};
use crate::repo::users;
use serde_json::json;

fn handle_users_list(state: &mut AppState, _req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    Ok(json!({ "users": users::list(conn)? }))
}

fn handle_users_create(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let username = get_str(&req.params, "username")?;
    let pass = get_str(&req.params, "password")?;
    let role = match opt_str(&req.params, "role") {
        Some(r) => Role::parse(r).ok_or_else(|| AppError::validation("role must be admin or staff"))?,
        None => Role::Staff,
    };
    let user = users::create(conn, username, pass, role, state.config.hash_cost)?;
    tracing::info!(username = %user.username, role = role.as_str(), "admin user created");
    Ok(json!({ "user": user }))
}

fn handle_users_delete(state: &mut AppState, req: &Request) -> AppResult<serde_json::Value> {
    let conn = conn(&state.db)?;
    let user_id = get_i64(&req.params, "userId")?;
    let user = users::delete(conn, user_id)?;
    state.sessions.revoke_admin_user(user.id);
    tracing::info!(username = %user.username, "admin user deleted");
    Ok(json!({ "userId": user.id }))
}

pub fn try_handle(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> Option<serde_json::Value> {
    let handler: fn(&mut AppState, &Request) -> AppResult<serde_json::Value> =
        match req.method.as_str() {
            "users.list" => handle_users_list,
            "users.create" => handle_users_create,
            "users.delete" => handle_users_delete,
            _ => return None,
        };
    let result = require_role(ctx, Role::Admin).and_then(|_| handler(state, req));
    Some(respond(&req.id, result))
}
