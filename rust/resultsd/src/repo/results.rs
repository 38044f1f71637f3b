use super::{students, subjects};
use crate::error::{AppError, AppResult};
use crate::grading::MarkPair;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

pub const DEFAULT_MAX_MARKS: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub id: i64,
    pub student_id: i64,
    pub reg_no: String,
    pub student_name: String,
    pub subject_id: i64,
    pub subject_name: String,
    pub marks: i64,
    pub max_marks: i64,
}

impl ResultRow {
    pub fn mark_pair(&self) -> MarkPair {
        MarkPair {
            marks: self.marks,
            max_marks: self.max_marks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

const SELECT_RESULT: &str = "SELECT r.id, r.student_id, st.reg_no, st.name, r.subject_id, sj.name, r.marks, r.max_marks
     FROM results r
     JOIN students st ON st.id = r.student_id
     JOIN subjects sj ON sj.id = r.subject_id";

fn map_result(row: &Row) -> rusqlite::Result<ResultRow> {
    Ok(ResultRow {
        id: row.get(0)?,
        student_id: row.get(1)?,
        reg_no: row.get(2)?,
        student_name: row.get(3)?,
        subject_id: row.get(4)?,
        subject_name: row.get(5)?,
        marks: row.get(6)?,
        max_marks: row.get(7)?,
    })
}

pub fn validate_marks(marks: i64, max_marks: i64) -> AppResult<()> {
    if max_marks <= 0 {
        return Err(AppError::validation("max marks must be greater than zero"));
    }
    if marks < 0 {
        return Err(AppError::validation("marks must not be negative"));
    }
    Ok(())
}

/// Insert the result for `(student, subject)` or overwrite the marks of the
/// one already there.
pub fn upsert(
    conn: &Connection,
    student_id: i64,
    subject_id: i64,
    marks: i64,
    max_marks: i64,
) -> AppResult<UpsertOutcome> {
    validate_marks(marks, max_marks)?;
    let student = students::get(conn, student_id)?;
    let subject = subjects::get(conn, subject_id)?;
    if student.class_id != subject.class_id {
        return Err(AppError::validation(
            "subject does not belong to the student's class",
        ));
    }
    write_pair(conn, student_id, subject_id, marks, max_marks)
}

/// Upsert for ids already resolved within one class; only the marks are
/// checked.
pub(crate) fn write_pair(
    conn: &Connection,
    student_id: i64,
    subject_id: i64,
    marks: i64,
    max_marks: i64,
) -> AppResult<UpsertOutcome> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM results WHERE student_id = ? AND subject_id = ?",
            (student_id, subject_id),
            |r| r.get(0),
        )
        .optional()?;

    match existing {
        Some(id) => {
            conn.execute(
                "UPDATE results SET marks = ?, max_marks = ? WHERE id = ?",
                (marks, max_marks, id),
            )?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            conn.execute(
                "INSERT INTO results(student_id, subject_id, marks, max_marks) VALUES(?, ?, ?, ?)",
                (student_id, subject_id, marks, max_marks),
            )?;
            Ok(UpsertOutcome::Inserted)
        }
    }
}

pub fn get(conn: &Connection, id: i64) -> AppResult<ResultRow> {
    conn.query_row(&format!("{SELECT_RESULT} WHERE r.id = ?"), [id], map_result)
        .optional()?
        .ok_or_else(|| AppError::not_found("result"))
}

/// One student's results ordered by subject name, the mark sheet order.
pub fn list_for_student(conn: &Connection, student_id: i64) -> AppResult<Vec<ResultRow>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_RESULT} WHERE r.student_id = ? ORDER BY sj.name"
    ))?;
    let rows = stmt
        .query_map([student_id], map_result)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Results for every subject of a class.
pub fn list_for_class(conn: &Connection, class_id: i64) -> AppResult<Vec<ResultRow>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_RESULT} WHERE sj.class_id = ? ORDER BY st.id, sj.name"
    ))?;
    let rows = stmt
        .query_map([class_id], map_result)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    let changed = conn.execute("DELETE FROM results WHERE id = ?", [id])?;
    if changed == 0 {
        return Err(AppError::not_found("result"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password;
    use crate::grading::compute_totals;
    use crate::repo::classes;
    use crate::repo::fixtures::{cheap_cost, conn};

    struct Seed {
        class_id: i64,
        student_id: i64,
        math: i64,
        science: i64,
    }

    fn seed(conn: &Connection) -> Seed {
        let class = classes::create(conn, "10", Some("A")).expect("class");
        let hash = password::hash_password("x", cheap_cost()).expect("hash");
        let student_id =
            students::insert_with_hash(conn, "R1", "Asha", None, class.id, &hash).expect("student");
        let math = subjects::create(conn, "Math", class.id).expect("math").id;
        let science = subjects::create(conn, "Science", class.id).expect("science").id;
        Seed {
            class_id: class.id,
            student_id,
            math,
            science,
        }
    }

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |r| r.get(0)).expect("count")
    }

    #[test]
    fn upsert_updates_in_place() {
        let conn = conn();
        let s = seed(&conn);
        assert_eq!(
            upsert(&conn, s.student_id, s.math, 40, 50).expect("insert"),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            upsert(&conn, s.student_id, s.math, 45, 50).expect("update"),
            UpsertOutcome::Updated
        );
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM results"), 1);
        let rows = list_for_student(&conn, s.student_id).expect("list");
        assert_eq!(rows[0].marks, 45);
        assert_eq!(rows[0].max_marks, 50);
    }

    #[test]
    fn totals_follow_stored_results() {
        let conn = conn();
        let s = seed(&conn);
        upsert(&conn, s.student_id, s.math, 45, 50).expect("math");
        upsert(&conn, s.student_id, s.science, 38, 50).expect("science");
        let rows = list_for_student(&conn, s.student_id).expect("list");
        let names: Vec<&str> = rows.iter().map(|r| r.subject_name.as_str()).collect();
        assert_eq!(names, vec!["Math", "Science"]);
        let totals = compute_totals(rows.iter().map(ResultRow::mark_pair));
        assert_eq!(totals.total_marks, 83);
        assert_eq!(totals.total_max_marks, 100);
        assert_eq!(totals.grade, "A");
        assert_eq!(totals.percentage, 83.0);
    }

    #[test]
    fn marks_are_validated() {
        let conn = conn();
        let s = seed(&conn);
        for (marks, max) in [(-1, 100), (10, 0), (10, -5)] {
            assert!(matches!(
                upsert(&conn, s.student_id, s.math, marks, max),
                Err(AppError::Validation(_))
            ));
        }
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM results"), 0);
    }

    #[test]
    fn bonus_marks_above_the_maximum_are_kept() {
        let conn = conn();
        let s = seed(&conn);
        upsert(&conn, s.student_id, s.math, 105, 100).expect("bonus");
        let rows = list_for_student(&conn, s.student_id).expect("list");
        assert_eq!(rows[0].marks, 105);
        let totals = compute_totals(rows.iter().map(ResultRow::mark_pair));
        assert_eq!(totals.percentage, 105.0);
        assert_eq!(totals.grade, "A+");
    }

    #[test]
    fn subject_from_another_class_is_rejected() {
        let conn = conn();
        let s = seed(&conn);
        let other = classes::create(&conn, "11", None).expect("class");
        let art = subjects::create(&conn, "Art", other.id).expect("art");
        assert!(matches!(
            upsert(&conn, s.student_id, art.id, 10, 20),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            upsert(&conn, 999, s.math, 10, 20),
            Err(AppError::NotFound { entity: "student" })
        ));
    }

    #[test]
    fn class_delete_cascades_to_students_and_results() {
        let conn = conn();
        let s = seed(&conn);
        upsert(&conn, s.student_id, s.math, 45, 50).expect("math");
        upsert(&conn, s.student_id, s.science, 38, 50).expect("science");

        let removed = classes::delete(&conn, s.class_id).expect("delete");
        assert_eq!(removed.student_ids, vec![s.student_id]);
        assert_eq!(removed.results_deleted, 2);
        assert_eq!(removed.subjects_deleted, 2);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM students"), 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM results"), 0);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM subjects"), 0);
    }

    #[test]
    fn student_and_subject_deletes_cascade_to_results() {
        let conn = conn();
        let s = seed(&conn);
        upsert(&conn, s.student_id, s.math, 45, 50).expect("math");
        upsert(&conn, s.student_id, s.science, 38, 50).expect("science");

        assert_eq!(subjects::delete(&conn, s.math).expect("subject"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM results"), 1);
        assert_eq!(students::delete(&conn, s.student_id).expect("student"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM results"), 0);
        assert!(matches!(
            students::delete(&conn, s.student_id),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn moving_a_student_with_results_is_refused() {
        let conn = conn();
        let s = seed(&conn);
        upsert(&conn, s.student_id, s.math, 45, 50).expect("math");
        let other = classes::create(&conn, "11", None).expect("class");
        let patch = students::StudentPatch {
            class_id: Some(other.id),
            ..Default::default()
        };
        assert!(matches!(
            students::update(&conn, s.student_id, &patch),
            Err(AppError::Validation(_))
        ));
    }
}
