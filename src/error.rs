use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Concurrent update: {0}")]
    ConcurrentUpdate(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("{} {} not found", entity, id))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::InvalidState(msg) => (StatusCode::CONFLICT, msg),
            Error::Duplicate(msg) => (StatusCode::CONFLICT, msg),
            Error::ConcurrentUpdate(msg) => (StatusCode::CONFLICT, msg),
            Error::Delivery(msg) => (StatusCode::BAD_GATEWAY, msg),
            Error::Reqwest(err) => (
                StatusCode::BAD_GATEWAY,
                format!("External service error: {}", err),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Duplicate(db.message().to_string())
            }
            other => Error::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_conflicts_map_to_conflict_status() {
        let resp = Error::InvalidState("application cannot be withdrawn".into()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = Error::Forbidden("no membership".into()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let resp = Error::not_found("Application", "abc").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
