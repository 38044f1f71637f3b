use super::{classes, optional, required};
use crate::auth::password;
use crate::config::HashCost;
use crate::error::{AppError, AppResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;

const DUPLICATE_MESSAGE: &str = "registration number or email already in use";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub reg_no: String,
    pub name: String,
    pub email: Option<String>,
    pub class_id: i64,
    pub class_name: String,
    pub section: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub reg_no: String,
    pub name: String,
    pub email: Option<String>,
    pub class_id: i64,
    pub password: String,
}

/// Fields left as `None` are unchanged. An empty `email` clears it.
#[derive(Debug, Clone, Default)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub class_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPage {
    pub students: Vec<Student>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub has_more: bool,
}

const SELECT_STUDENT: &str = "SELECT s.id, s.reg_no, s.name, s.email, s.class_id, c.name, c.section
     FROM students s
     JOIN classes c ON c.id = s.class_id";

fn map_student(row: &Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        reg_no: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        class_id: row.get(4)?,
        class_name: row.get(5)?,
        section: row.get(6)?,
    })
}

pub fn create(conn: &Connection, input: &NewStudent, cost: HashCost) -> AppResult<Student> {
    let reg_no = required(&input.reg_no, "reg no")?;
    let name = required(&input.name, "name")?;
    if input.password.is_empty() {
        return Err(AppError::validation("password is required"));
    }
    classes::get(conn, input.class_id)?;

    let hash = password::hash_password(&input.password, cost)?;
    let id = insert_with_hash(
        conn,
        &reg_no,
        &name,
        optional(input.email.as_deref()).as_deref(),
        input.class_id,
        &hash,
    )?;
    get(conn, id)
}

/// Insert with an already-hashed credential. Bulk import hashes its default
/// password once and reuses it for every row.
pub(crate) fn insert_with_hash(
    conn: &Connection,
    reg_no: &str,
    name: &str,
    email: Option<&str>,
    class_id: i64,
    password_hash: &str,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO students(reg_no, name, email, password_hash, class_id) VALUES(?, ?, ?, ?, ?)",
        (reg_no, name, email, password_hash, class_id),
    )
    .map_err(|e| AppError::from(e).on_duplicate(DUPLICATE_MESSAGE))?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, id: i64, patch: &StudentPatch) -> AppResult<Student> {
    let current = get(conn, id)?;

    let name = match &patch.name {
        Some(n) => required(n, "name")?,
        None => current.name.clone(),
    };
    let email = match &patch.email {
        Some(e) => optional(Some(e)),
        None => current.email.clone(),
    };
    let class_id = match patch.class_id {
        Some(cid) if cid != current.class_id => {
            classes::get(conn, cid)?;
            let result_count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM results WHERE student_id = ?",
                [id],
                |r| r.get(0),
            )?;
            if result_count > 0 {
                return Err(AppError::validation(
                    "student has results in the current class; delete them before moving the student",
                ));
            }
            cid
        }
        _ => current.class_id,
    };

    conn.execute(
        "UPDATE students SET name = ?, email = ?, class_id = ? WHERE id = ?",
        (&name, &email, class_id, id),
    )
    .map_err(|e| AppError::from(e).on_duplicate(DUPLICATE_MESSAGE))?;
    get(conn, id)
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Student> {
    conn.query_row(
        &format!("{SELECT_STUDENT} WHERE s.id = ?"),
        [id],
        map_student,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("student"))
}

pub fn get_by_reg_no(conn: &Connection, reg_no: &str) -> AppResult<Option<Student>> {
    Ok(conn
        .query_row(
            &format!("{SELECT_STUDENT} WHERE s.reg_no = ?"),
            [reg_no.trim()],
            map_student,
        )
        .optional()?)
}

pub fn exists_by_reg_no(conn: &Connection, reg_no: &str) -> AppResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM students WHERE reg_no = ?",
            [reg_no.trim()],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn list_by_class(conn: &Connection, class_id: i64) -> AppResult<Vec<Student>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_STUDENT} WHERE s.class_id = ? ORDER BY s.name, s.id"
    ))?;
    let rows = stmt
        .query_map([class_id], map_student)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every student with its class, in insertion order.
pub fn list_all(conn: &Connection) -> AppResult<Vec<Student>> {
    let mut stmt = conn.prepare(&format!("{SELECT_STUDENT} ORDER BY s.id"))?;
    let rows = stmt
        .query_map([], map_student)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn escape_like(q: &str) -> String {
    let mut out = String::with_capacity(q.len() + 2);
    out.push('%');
    for ch in q.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

/// Case-insensitive substring search over name and reg no, newest first.
pub fn search(
    conn: &Connection,
    q: Option<&str>,
    class_id: Option<i64>,
    page: i64,
    per_page: i64,
) -> AppResult<StudentPage> {
    // Capped so the offset arithmetic below cannot overflow.
    let page = page.clamp(1, i64::MAX / MAX_PER_PAGE);
    let per_page = per_page.clamp(1, MAX_PER_PAGE);

    let mut clauses: Vec<&str> = Vec::new();
    let mut binds: Vec<Value> = Vec::new();
    if let Some(q) = optional(q) {
        clauses.push(
            "(LOWER(s.name) LIKE LOWER(?) ESCAPE '\\' OR LOWER(s.reg_no) LIKE LOWER(?) ESCAPE '\\')",
        );
        let pattern = escape_like(&q);
        binds.push(Value::Text(pattern.clone()));
        binds.push(Value::Text(pattern));
    }
    if let Some(cid) = class_id {
        clauses.push("s.class_id = ?");
        binds.push(Value::Integer(cid));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM students s{where_sql}"),
        params_from_iter(binds.iter()),
        |r| r.get(0),
    )?;

    let mut page_binds = binds.clone();
    page_binds.push(Value::Integer(per_page));
    page_binds.push(Value::Integer((page - 1) * per_page));
    let mut stmt = conn.prepare(&format!(
        "{SELECT_STUDENT}{where_sql} ORDER BY s.id DESC LIMIT ? OFFSET ?"
    ))?;
    let students = stmt
        .query_map(params_from_iter(page_binds.iter()), map_student)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(StudentPage {
        students,
        total,
        page,
        per_page,
        has_more: page * per_page < total,
    })
}

pub fn set_password(conn: &Connection, id: i64, new_password: &str, cost: HashCost) -> AppResult<()> {
    let hash = password::hash_password(new_password, cost)?;
    let changed = conn.execute(
        "UPDATE students SET password_hash = ? WHERE id = ?",
        (&hash, id),
    )?;
    if changed == 0 {
        return Err(AppError::not_found("student"));
    }
    Ok(())
}

/// The student when `reg_no` exists and the password matches.
pub fn verify_login(conn: &Connection, reg_no: &str, pass: &str) -> AppResult<Option<Student>> {
    let row: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM students WHERE reg_no = ?",
            [reg_no.trim()],
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

pub fn delete(conn: &Connection, id: i64) -> AppResult<usize> {
    get(conn, id)?;
    let results_deleted = conn.execute("DELETE FROM results WHERE student_id = ?", [id])?;
    conn.execute("DELETE FROM students WHERE id = ?", [id])?;
    Ok(results_deleted)
}
