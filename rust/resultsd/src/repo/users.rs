use super::required;
use crate::auth::{password, Role};
use crate::config::HashCost;
use crate::error::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

fn map_user(row: &Row) -> rusqlite::Result<AdminUser> {
    let role: String = row.get(2)?;
    Ok(AdminUser {
        id: row.get(0)?,
        username: row.get(1)?,
        // The CHECK constraint keeps this to admin/staff; fall back to the
        // narrower role regardless.
        role: Role::parse(&role).unwrap_or(Role::Staff),
        created_at: row.get(3)?,
    })
}

pub fn create(
    conn: &Connection,
    username: &str,
    pass: &str,
    role: Role,
    cost: HashCost,
) -> AppResult<AdminUser> {
    let username = required(username, "username")?;
    if pass.is_empty() {
        return Err(AppError::validation("password is required"));
    }
    let hash = password::hash_password(pass, cost)?;
    conn.execute(
        "INSERT INTO admin_users(username, password_hash, role, created_at) VALUES(?, ?, ?, ?)",
        (&username, &hash, role.as_str(), chrono::Utc::now().to_rfc3339()),
    )
    .map_err(|e| AppError::from(e).on_duplicate("username already exists"))?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> AppResult<AdminUser> {
    conn.query_row(
        "SELECT id, username, role, created_at FROM admin_users WHERE id = ?",
        [id],
        map_user,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("user"))
}

pub fn get_by_username(conn: &Connection, username: &str) -> AppResult<Option<AdminUser>> {
    Ok(conn
        .query_row(
            "SELECT id, username, role, created_at FROM admin_users WHERE username = ?",
            [username.trim()],
            map_user,
        )
        .optional()?)
}

pub fn list(conn: &Connection) -> AppResult<Vec<AdminUser>> {
    let mut stmt =
        conn.prepare("SELECT id, username, role, created_at FROM admin_users ORDER BY id DESC")?;
    let rows = stmt
        .query_map([], map_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn verify_login(conn: &Connection, username: &str, pass: &str) -> AppResult<Option<AdminUser>> {
    let row: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM admin_users WHERE username = ?",
            [username.trim()],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((id, hash)) = row else {
        return Ok(None);
    };
    if !password::verify_password(pass, &hash)? {
        return Ok(None);
    }
    Ok(Some(get(conn, id)?))
}

/// The built-in `admin` account can never be removed.
pub fn delete(conn: &Connection, id: i64) -> AppResult<AdminUser> {
    let user = get(conn, id)?;
    if user.username == DEFAULT_ADMIN_USERNAME {
        return Err(AppError::Forbidden(
            "the built-in admin account cannot be deleted".to_string(),
        ));
    }
    conn.execute("DELETE FROM admin_users WHERE id = ?", [id])?;
    Ok(user)
}

/// Creates `admin` / `admin123` when no account of that name exists. Returns
/// true when the account was created.
pub fn ensure_default_admin(conn: &Connection, cost: HashCost) -> AppResult<bool> {
    if get_by_username(conn, DEFAULT_ADMIN_USERNAME)?.is_some() {
        return Ok(false);
    }
    create(
        conn,
        DEFAULT_ADMIN_USERNAME,
        DEFAULT_ADMIN_PASSWORD,
        Role::Admin,
        cost,
    )?;
    Ok(true)
}
