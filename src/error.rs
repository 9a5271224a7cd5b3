use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Failure inside a store implementation.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(String),

    #[display(fmt = "corrupt row: {}", _0)]
    CorruptRow(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by the attendance toggle flow.
///
/// Each variant renders as `{"error": "<message>"}`; persistence failures only expose a
/// generic message, the detail stays in the server log.
#[derive(Debug, Display)]
pub enum AttendanceError {
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "Failed to record attendance")]
    Persistence(StoreError),
}

impl std::error::Error for AttendanceError {}

impl From<StoreError> for AttendanceError {
    fn from(err: StoreError) -> Self {
        AttendanceError::Persistence(err)
    }
}

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Validation(_) => StatusCode::BAD_REQUEST,
            AttendanceError::NotFound(_) => StatusCode::NOT_FOUND,
            AttendanceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_detail_is_not_exposed() {
        let err = AttendanceError::from(StoreError::Database("deadlock on attendance_logs".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to record attendance");
    }

    #[test]
    fn user_errors_map_to_client_statuses() {
        let missing = AttendanceError::Validation("RFID tag is required".into());
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.to_string(), "RFID tag is required");

        let unknown = AttendanceError::NotFound("Employee not found".into());
        assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
    }
}
