use super::{optional, required};
use crate::error::{AppError, AppResult};
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRoom {
    pub id: i64,
    pub name: String,
    pub section: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    #[serde(flatten)]
    pub class: ClassRoom,
    pub student_count: i64,
    pub subject_count: i64,
}

/// Rows removed by a cascading class delete.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeletion {
    pub student_ids: Vec<i64>,
    pub subjects_deleted: usize,
    pub results_deleted: usize,
}

fn map_class(row: &Row) -> rusqlite::Result<ClassRoom> {
    Ok(ClassRoom {
        id: row.get(0)?,
        name: row.get(1)?,
        section: row.get(2)?,
    })
}

pub fn create(conn: &Connection, name: &str, section: Option<&str>) -> AppResult<ClassRoom> {
    let name = required(name, "class name")?;
    let section = optional(section);
    conn.execute(
        "INSERT INTO classes(name, section) VALUES(?, ?)",
        (&name, &section),
    )
    .map_err(|e| AppError::from(e).on_duplicate("class with this name and section already exists"))?;
    Ok(ClassRoom {
        id: conn.last_insert_rowid(),
        name,
        section,
    })
}

pub fn get(conn: &Connection, id: i64) -> AppResult<ClassRoom> {
    conn.query_row(
        "SELECT id, name, section FROM classes WHERE id = ?",
        [id],
        map_class,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("class"))
}

pub fn find_by_name_section(
    conn: &Connection,
    name: &str,
    section: Option<&str>,
) -> AppResult<Option<ClassRoom>> {
    let section = optional(section);
    Ok(conn
        .query_row(
            "SELECT id, name, section FROM classes WHERE name = ? AND IFNULL(section, '') = IFNULL(?, '')",
            (name.trim(), &section),
            map_class,
        )
        .optional()?)
}

/// Existing class for `(name, section)`, creating it when absent. The flag is
/// true when a class was created.
pub fn find_or_create(
    conn: &Connection,
    name: &str,
    section: Option<&str>,
) -> AppResult<(ClassRoom, bool)> {
    if let Some(existing) = find_by_name_section(conn, name, section)? {
        return Ok((existing, false));
    }
    Ok((create(conn, name, section)?, true))
}

pub fn list(conn: &Connection) -> AppResult<Vec<ClassSummary>> {
    let mut stmt = conn.prepare(
        "SELECT
           c.id,
           c.name,
           c.section,
           (SELECT COUNT(*) FROM students s WHERE s.class_id = c.id) AS student_count,
           (SELECT COUNT(*) FROM subjects sj WHERE sj.class_id = c.id) AS subject_count
         FROM classes c
         ORDER BY c.name, IFNULL(c.section, '')",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ClassSummary {
                class: map_class(row)?,
                student_count: row.get(3)?,
                subject_count: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete(conn: &Connection, id: i64) -> AppResult<ClassDeletion> {
    get(conn, id)?;

    let student_ids = conn
        .prepare("SELECT id FROM students WHERE class_id = ? ORDER BY id")?
        .query_map([id], |r| r.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    // Dependency order; the schema has no ON DELETE CASCADE.
    let results_deleted = conn.execute(
        "DELETE FROM results
         WHERE student_id IN (SELECT id FROM students WHERE class_id = ?1)
            OR subject_id IN (SELECT id FROM subjects WHERE class_id = ?1)",
        [id],
    )?;
    conn.execute("DELETE FROM students WHERE class_id = ?", [id])?;
    let subjects_deleted = conn.execute("DELETE FROM subjects WHERE class_id = ?", [id])?;
    conn.execute("DELETE FROM classes WHERE id = ?", [id])?;

    Ok(ClassDeletion {
        student_ids,
        subjects_deleted,
        results_deleted,
    })
}
