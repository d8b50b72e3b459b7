use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scout_core::error::CoreError;
use serde::Serialize;

/// Message returned for every 500; the underlying cause is only logged.
const INTERNAL_MSG: &str = "An internal error occurred";

/// Error type returned by every handler and extractor.
///
/// Domain failures arrive as [`CoreError`]; the remaining variants carry
/// infrastructure errors that are logged and reported as a sanitized 500
/// (except unique violations, which become 409).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(argon2::password_hash::Error),

    #[error("Session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(err)
    }
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Core(CoreError::Unauthorized(msg.into()))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Core(CoreError::Conflict(msg.into()))
    }

    /// HTTP status, machine-readable code, and client-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::Core(CoreError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),
            Self::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            Self::Core(CoreError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            Self::Core(CoreError::Unauthorized(msg)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            Self::Database(err) => match unique_violation(err) {
                Some(constraint) => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    conflict_message(constraint),
                ),
                None if matches!(err, sqlx::Error::RowNotFound) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "Resource not found".to_string(),
                ),
                None => internal(self),
            },
            Self::PasswordHash(_) | Self::Token(_) => internal(self),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorBody {
            error: &message,
            code,
        };
        (status, Json(body)).into_response()
    }
}

fn internal(err: &AppError) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %err, "Request failed with internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MSG.to_string(),
    )
}

/// Name of the violated `uq_*` constraint if `err` is a PostgreSQL unique
/// violation (SQLSTATE 23505).
fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some("23505") {
        return None;
    }
    db_err.constraint().filter(|c| c.starts_with("uq_"))
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_users_email" => "User already exists".to_string(),
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}
