use rusqlite::ffi;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    DuplicateConstraint(String),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("reset link expired")]
    TokenExpired,

    #[error("invalid reset link")]
    TokenInvalid,

    #[error("select a workspace first")]
    NoWorkspace,

    #[error(transparent)]
    Db(rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Backup(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str) -> Self {
        AppError::NotFound { entity }
    }

    /// Stable error code reported over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "bad_params",
            AppError::DuplicateConstraint(_) => "duplicate",
            AppError::NotFound { .. } => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::TokenExpired => "token_expired",
            AppError::TokenInvalid => "token_invalid",
            AppError::NoWorkspace => "no_workspace",
            AppError::Db(_) => "db_query_failed",
            AppError::Io(_) => "io_failed",
            AppError::Csv(_) => "bad_csv",
            AppError::PasswordHash(_) | AppError::Token(_) | AppError::Backup(_) => "internal",
        }
    }

    /// Replace the storage-level message of a duplicate error with a
    /// caller-facing one. Other errors pass through untouched.
    pub fn on_duplicate(self, message: &str) -> Self {
        match self {
            AppError::DuplicateConstraint(_) => AppError::DuplicateConstraint(message.to_string()),
            other => other,
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, msg) = &e {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return AppError::DuplicateConstraint(
                        msg.clone().unwrap_or_else(|| "duplicate record".to_string()),
                    );
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return AppError::Validation("referenced record does not exist".to_string());
                }
                _ => {}
            }
        }
        AppError::Db(e)
    }
}
