use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    let ctx = state.context(req.session.as_deref());
    tracing::debug!(id = %req.id, method = %req.method, "request");

    if let Some(resp) = handlers::core::try_handle(state, &ctx, &req) {
        return resp;
    }
    if let Some(resp) = handlers::auth::try_handle(state, &ctx, &req) {
        return resp;
    }
    if let Some(resp) = handlers::classes::try_handle(state, &ctx, &req) {
        return resp;
    }
    if let Some(resp) = handlers::students::try_handle(state, &ctx, &req) {
        return resp;
    }
    if let Some(resp) = handlers::subjects::try_handle(state, &ctx, &req) {
        return resp;
    }
    if let Some(resp) = handlers::results::try_handle(state, &ctx, &req) {
        return resp;
    }
    if let Some(resp) = handlers::users::try_handle(state, &ctx, &req) {
        return resp;
    }
    if let Some(resp) = handlers::transfer::try_handle(state, &ctx, &req) {
        return resp;
    }
    if let Some(resp) = handlers::portal::try_handle(state, &ctx, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
