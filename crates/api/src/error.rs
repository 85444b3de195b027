use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use masjid_core::error::CoreError;
use serde::Serialize;

/// Error type returned by every handler.
///
/// Domain failures arrive as [`CoreError`]; the remaining variants cover
/// storage and request-shape problems detected at the HTTP edge. The JSON body
/// is always `{ "error": <message>, "code": <CODE> }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed input that never reaches the domain, such as a missing
    /// device identity.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort_unstable();
        CoreError::Validation(format!("Invalid value for: {}", fields.join(", "))).into()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// Status, machine-readable code and client-facing message.
type Classified = (StatusCode, &'static str, String);

const INTERNAL_MESSAGE: &str = "An internal error occurred";

fn internal() -> Classified {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

fn classify_core(err: &CoreError) -> Classified {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        // Missing or stale credentials. Permission denials are Forbidden.
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error) = match &self {
            AppError::Core(core) => classify_core(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        (status, axum::Json(ErrorBody { error, code })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Map a sqlx error onto the HTTP taxonomy.
///
/// Named `uq_` unique constraints become 409 and foreign-key violations
/// become 404 (the referenced user or masjid vanished mid-request).
/// Anything else is logged and sanitized to 500.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    let db_err = match err {
        sqlx::Error::RowNotFound => {
            return (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Resource not found".to_string(),
            )
        }
        sqlx::Error::Database(db_err) => db_err,
        other => {
            tracing::error!(error = %other, "Database error");
            return internal();
        }
    };

    match (db_err.code().as_deref(), db_err.constraint()) {
        (Some(PG_UNIQUE_VIOLATION), Some(constraint)) if constraint.starts_with("uq_") => {
            (StatusCode::CONFLICT, "CONFLICT", conflict_message(constraint))
        }
        (Some(PG_FOREIGN_KEY_VIOLATION), _) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Referenced user or masjid does not exist".to_string(),
        ),
        _ => {
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
    }
}

fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_masjid_members_user_masjid_role" => {
            "User already holds this role for the masjid".to_string()
        }
        "uq_users_email" => "Email is already registered".to_string(),
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}
