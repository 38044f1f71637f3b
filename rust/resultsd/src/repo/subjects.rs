use super::{classes, required};
use crate::error::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub class_id: i64,
    pub class_name: String,
    pub section: Option<String>,
}

const SELECT_SUBJECT: &str = "SELECT sj.id, sj.name, sj.class_id, c.name, c.section
     FROM subjects sj
     JOIN classes c ON c.id = sj.class_id";

fn map_subject(row: &Row) -> rusqlite::Result<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        class_id: row.get(2)?,
        class_name: row.get(3)?,
        section: row.get(4)?,
    })
}

pub fn create(conn: &Connection, name: &str, class_id: i64) -> AppResult<Subject> {
    let name = required(name, "subject name")?;
    classes::get(conn, class_id)?;
    conn.execute(
        "INSERT INTO subjects(name, class_id) VALUES(?, ?)",
        (&name, class_id),
    )
    .map_err(|e| AppError::from(e).on_duplicate("subject already exists in this class"))?;
    get(conn, conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> AppResult<Subject> {
    conn.query_row(&format!("{SELECT_SUBJECT} WHERE sj.id = ?"), [id], map_subject)
        .optional()?
        .ok_or_else(|| AppError::not_found("subject"))
}

pub fn list(conn: &Connection, class_id: Option<i64>) -> AppResult<Vec<Subject>> {
    let rows = match class_id {
        Some(cid) => conn
            .prepare(&format!(
                "{SELECT_SUBJECT} WHERE sj.class_id = ? ORDER BY sj.name"
            ))?
            .query_map([cid], map_subject)?
            .collect::<Result<Vec<_>, _>>()?,
        None => conn
            .prepare(&format!(
                "{SELECT_SUBJECT} ORDER BY c.name, IFNULL(c.section, ''), sj.name"
            ))?
            .query_map([], map_subject)?
            .collect::<Result<Vec<_>, _>>()?,
    };
    Ok(rows)
}

/// Subject name to id, restricted to one class.
pub fn ids_by_name(conn: &Connection, class_id: i64) -> AppResult<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT name, id FROM subjects WHERE class_id = ?")?;
    let map = stmt
        .query_map([class_id], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
        .collect::<Result<HashMap<_, _>, _>>()?;
    Ok(map)
}

pub fn delete(conn: &Connection, id: i64) -> AppResult<usize> {
    get(conn, id)?;
    let results_deleted = conn.execute("DELETE FROM results WHERE subject_id = ?", [id])?;
    conn.execute("DELETE FROM subjects WHERE id = ?", [id])?;
    Ok(results_deleted)
}
