use crate::auth::{require_role, RequestContext, Role};
use crate::backup;
use crate::error::{AppError, AppResult};
use crate::ipc::error::{err, ok, respond};
use crate::ipc::helpers::{conn, get_path, opt_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match get_path(&req.params, "path") {
        Ok(p) => p,
        Err(e) => return respond(&req.id, Err(e)),
    };

    match state.open_workspace(&path) {
        Ok(admin_created) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "adminCreated": admin_created
            }),
        ),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_workspace_backup(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> AppResult<serde_json::Value> {
    require_role(ctx, Role::Admin)?;
    let conn = conn(&state.db)?;
    let out_path = get_path(&req.params, "outPath")?;
    let manifest = backup::export_bundle(conn, &out_path)?;
    tracing::info!(out = %out_path.display(), bytes = manifest.db_bytes, "workspace backup written");
    Ok(json!({
        "outPath": out_path.to_string_lossy(),
        "manifest": manifest
    }))
}

/// Without an open workspace anyone may restore; otherwise only an admin.
fn handle_workspace_restore(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> AppResult<serde_json::Value> {
    if state.db.is_some() {
        require_role(ctx, Role::Admin)?;
    }
    let bundle_path = get_path(&req.params, "bundlePath")?;
    let target = match opt_str(&req.params, "workspacePath") {
        Some(p) => PathBuf::from(p),
        None => state
            .workspace
            .clone()
            .ok_or_else(|| AppError::validation("missing params.workspacePath"))?,
    };

    let previous = state.workspace.clone();
    state.close_workspace();
    let manifest = match backup::restore_bundle(&bundle_path, &target) {
        Ok(m) => m,
        Err(e) => {
            if let Some(prev) = previous {
                if let Err(reopen) = state.open_workspace(&prev) {
                    tracing::error!(error = %reopen, "failed to reopen workspace after failed restore");
                }
            }
            return Err(AppError::Backup(e));
        }
    };
    state.open_workspace(&target)?;
    tracing::info!(workspace = %target.display(), "workspace restored");
    Ok(json!({
        "workspacePath": target.to_string_lossy(),
        "manifest": manifest
    }))
}

pub fn try_handle(
    state: &mut AppState,
    ctx: &RequestContext,
    req: &Request,
) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.backup" => Some(respond(&req.id, handle_workspace_backup(state, ctx, req))),
        "workspace.restore" => Some(respond(&req.id, handle_workspace_restore(state, ctx, req))),
        _ => None,
    }
}
