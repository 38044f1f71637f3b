//! Storage operations per entity. Every function takes the connection (or a
//! transaction, which derefs to one) explicitly; the caller owns commit and
//! rollback.

pub mod classes;
pub mod results;
pub mod students;
pub mod subjects;
pub mod users;

use crate::error::{AppError, AppResult};

/// Trimmed, non-empty value of a required text field.
pub(crate) fn required(value: &str, field: &str) -> AppResult<String> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(v.to_string())
}

/// Trimmed optional text; blank becomes `None`.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::config::HashCost;
    use crate::db;
    use rusqlite::Connection;

    pub fn conn() -> Connection {
        db::open_in_memory().expect("in-memory db")
    }

    pub fn cheap_cost() -> HashCost {
        HashCost {
            memory_kib: 64,
            iterations: 1,
        }
    }
}
