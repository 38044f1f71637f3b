//! CSV export and import of students and results.
//!
//! The files are UTF-8, comma separated, with a header row and CRLF record
//! endings. Column order is fixed; on import columns are matched by header
//! name, so files written by older exports keep loading.

use crate::auth::password;
use crate::config::HashCost;
use crate::error::{AppError, AppResult};
use crate::repo::{classes, results, students, subjects};
use csv::{ReaderBuilder, Terminator, Trim, WriterBuilder};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const STUDENT_COLUMNS: [&str; 5] = ["reg_no", "name", "email", "class_name", "section"];
pub const RESULT_COLUMNS: [&str; 4] = ["reg_no", "subject", "marks", "max_marks"];

/// Credential given to every student created by an import.
pub const IMPORTED_STUDENT_PASSWORD: &str = "Pass@123";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentCsvRow {
    pub reg_no: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub class_name: String,
    #[serde(default)]
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCsvRow {
    pub reg_no: String,
    pub subject: String,
    #[serde(default)]
    pub marks: Option<i64>,
    #[serde(default)]
    pub max_marks: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentImport {
    pub created: usize,
    pub skipped: usize,
    pub classes_created: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultImport {
    pub processed: usize,
    pub skipped: usize,
}

fn write_csv<R: Serialize>(header: &[&str], rows: &[R]) -> AppResult<String> {
    let mut w = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());
    w.write_record(header)?;
    for row in rows {
        w.serialize(row)?;
    }
    let bytes = w.into_inner().map_err(|e| AppError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn reader<'a>(text: &'a str, required: &[&str]) -> AppResult<csv::Reader<&'a [u8]>> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?;
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(AppError::validation(format!("missing CSV column: {column}")));
        }
    }
    Ok(rdr)
}

pub fn export_students(conn: &Connection) -> AppResult<(String, usize)> {
    let rows: Vec<StudentCsvRow> = students::list_all(conn)?
        .into_iter()
        .map(|s| StudentCsvRow {
            reg_no: s.reg_no,
            name: s.name,
            email: s.email,
            class_name: s.class_name,
            section: s.section,
        })
        .collect();
    Ok((write_csv(&STUDENT_COLUMNS, &rows)?, rows.len()))
}

pub fn export_results(conn: &Connection, class_id: i64) -> AppResult<(String, usize)> {
    classes::get(conn, class_id)?;
    let rows: Vec<ResultCsvRow> = results::list_for_class(conn, class_id)?
        .into_iter()
        .map(|r| ResultCsvRow {
            reg_no: r.reg_no,
            subject: r.subject_name,
            marks: Some(r.marks),
            max_marks: Some(r.max_marks),
        })
        .collect();
    Ok((write_csv(&RESULT_COLUMNS, &rows)?, rows.len()))
}

/// Creation-only: existing registration numbers are left untouched. Classes
/// named by a row are created on the fly.
pub fn import_students(conn: &Connection, text: &str, cost: HashCost) -> AppResult<StudentImport> {
    let mut rdr = reader(text, &["reg_no", "name", "class_name"])?;
    let mut summary = StudentImport::default();
    let mut default_hash: Option<String> = None;

    for record in rdr.deserialize::<StudentCsvRow>() {
        let Ok(row) = record else {
            summary.skipped += 1;
            continue;
        };
        if row.reg_no.is_empty() || row.name.is_empty() || row.class_name.is_empty() {
            summary.skipped += 1;
            continue;
        }

        let (class, class_created) =
            classes::find_or_create(conn, &row.class_name, row.section.as_deref())?;
        if class_created {
            summary.classes_created += 1;
        }
        if students::exists_by_reg_no(conn, &row.reg_no)? {
            summary.skipped += 1;
            continue;
        }

        let hash = match &default_hash {
            Some(h) => h.clone(),
            None => {
                let h = password::hash_password(IMPORTED_STUDENT_PASSWORD, cost)?;
                default_hash = Some(h.clone());
                h
            }
        };
        match students::insert_with_hash(
            conn,
            &row.reg_no,
            &row.name,
            row.email.as_deref().filter(|e| !e.is_empty()),
            class.id,
            &hash,
        ) {
            Ok(_) => summary.created += 1,
            // An email already taken by another student only drops this row.
            Err(AppError::DuplicateConstraint(_)) => summary.skipped += 1,
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        created = summary.created,
        skipped = summary.skipped,
        classes_created = summary.classes_created,
        "students imported"
    );
    Ok(summary)
}

/// Upserts results for one class. Rows whose student or subject is not in
/// that class, or whose marks do not parse, are skipped without error.
pub fn import_results(conn: &Connection, class_id: i64, text: &str) -> AppResult<ResultImport> {
    classes::get(conn, class_id)?;
    let mut rdr = reader(text, &["reg_no", "subject"])?;

    let subject_ids = subjects::ids_by_name(conn, class_id)?;
    let student_ids: HashMap<String, i64> = students::list_by_class(conn, class_id)?
        .into_iter()
        .map(|s| (s.reg_no, s.id))
        .collect();

    let mut summary = ResultImport::default();
    for record in rdr.deserialize::<ResultCsvRow>() {
        let Ok(row) = record else {
            summary.skipped += 1;
            continue;
        };
        let (Some(&student_id), Some(&subject_id)) =
            (student_ids.get(&row.reg_no), subject_ids.get(&row.subject))
        else {
            summary.skipped += 1;
            continue;
        };
        let marks = row.marks.unwrap_or(0);
        let max_marks = row.max_marks.unwrap_or(results::DEFAULT_MAX_MARKS);
        if results::validate_marks(marks, max_marks).is_err() {
            summary.skipped += 1;
            continue;
        }
        results::write_pair(conn, student_id, subject_id, marks, max_marks)?;
        summary.processed += 1;
    }

    tracing::info!(
        class_id,
        processed = summary.processed,
        skipped = summary.skipped,
        "results imported"
    );
    Ok(summary)
}
