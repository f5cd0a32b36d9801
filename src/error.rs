use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Error surfaced to API callers.
///
/// Each variant maps to one class of failure: bad input, an action that is
/// not allowed in the current state, a stale read, a missing row, a failed
/// external write, a missing or bad credential, or an unexpected internal
/// fault.
#[derive(Debug, Display, PartialEq)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{}", _0)]
    Precondition(String),

    #[display(fmt = "State has changed since it was last read, refresh and try again: {}", _0)]
    Conflict(String),

    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),

    #[display(fmt = "External dependency failed: {}", _0)]
    Dependency(String),

    #[display(fmt = "Forbidden: {}", _0)]
    Forbidden(&'static str),

    #[display(fmt = "Unauthorized: {}", _0)]
    Unauthorized(&'static str),

    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Precondition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Dependency(_) => StatusCode::BAD_GATEWAY,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

/// A guarded `UPDATE ... WHERE <state> = <state read earlier>` that matched
/// no row means someone else moved the row on first.
pub fn ensure_unchanged<F>(rows_affected: u64, what: F) -> Result<(), AppError>
where
    F: FnOnce() -> String,
{
    if rows_affected == 0 {
        Err(AppError::Conflict(what()))
    } else {
        Ok(())
    }
}

/// Duplicate-key failure (MySQL 1062 `ER_DUP_ENTRY` and its siblings). Other
/// integrity violations such as NOT NULL or foreign keys do not count.
pub fn is_duplicate_key(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
