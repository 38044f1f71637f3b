use crate::error::AppResult;
use crate::grading::{compute_totals, Totals};
use crate::repo::results::{self, ResultRow};
use crate::repo::students::{self, Student};
use rusqlite::Connection;
use serde::Serialize;
use std::fmt::Write;

const SUBJECT_WIDTH: usize = 24;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSheet {
    pub student: Student,
    pub results: Vec<ResultRow>,
    pub totals: Totals,
}

impl MarkSheet {
    pub fn build(conn: &Connection, student_id: i64) -> AppResult<Self> {
        let student = students::get(conn, student_id)?;
        let results = results::list_for_student(conn, student_id)?;
        let totals = compute_totals(results.iter().map(ResultRow::mark_pair));
        Ok(Self {
            student,
            results,
            totals,
        })
    }

    pub fn class_label(&self) -> String {
        match &self.student.section {
            Some(section) => format!("{} - {}", self.student.class_name, section),
            None => self.student.class_name.clone(),
        }
    }

    /// Fixed-width plain text suitable for printing.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "OFFICIAL MARK SHEET");
        let _ = writeln!(
            out,
            "Name: {} | Reg No: {}",
            self.student.name, self.student.reg_no
        );
        let _ = writeln!(out, "Class: {}", self.class_label());
        let _ = writeln!(out);
        if self.results.is_empty() {
            let _ = writeln!(out, "No results published yet.");
        } else {
            let _ = writeln!(out, "{:<SUBJECT_WIDTH$} {:>6} {:>6}", "Subject", "Marks", "Max");
            for r in &self.results {
                let _ = writeln!(
                    out,
                    "{:<SUBJECT_WIDTH$} {:>6} {:>6}",
                    r.subject_name, r.marks, r.max_marks
                );
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Total: {} / {} | %: {:.2} | Grade: {}",
            self.totals.total_marks,
            self.totals.total_max_marks,
            self.totals.percentage,
            self.totals.grade
        );
        out
    }
}
