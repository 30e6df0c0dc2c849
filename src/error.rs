use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::services::EnrollmentError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Enrollment error: {0}")]
    Enrollment(#[from] EnrollmentError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(err) => database_status(err),
            AppError::Enrollment(err) => match err {
                EnrollmentError::NotEligible => (StatusCode::FORBIDDEN, "Access denied"),
                EnrollmentError::CourseUnavailable => (StatusCode::NOT_FOUND, "Course not available"),
                EnrollmentError::AlreadyEnrolled => (StatusCode::CONFLICT, "Already enrolled"),
                EnrollmentError::NotEnrolled => (StatusCode::NOT_FOUND, "Not enrolled in this course"),
                EnrollmentError::LessonNotTracked => {
                    (StatusCode::NOT_FOUND, "Lesson not found in progress")
                }
                EnrollmentError::Conflict => (StatusCode::CONFLICT, "Resource conflict"),
                EnrollmentError::Database(err) => database_status(err),
            },
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, "Access denied"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Resource not found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "Resource conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request"),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

fn database_status(err: &DatabaseError) -> (StatusCode, &'static str) {
    match err {
        DatabaseError::NotFound => (StatusCode::NOT_FOUND, "Resource not found"),
        DatabaseError::Duplicate => (StatusCode::CONFLICT, "Resource already exists"),
        DatabaseError::Conflict => (StatusCode::CONFLICT, "Resource conflict"),
        DatabaseError::Sqlx(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal server error occurred",
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "message": error_message,
                "details": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enrollment_errors_map_to_distinct_statuses() {
        let cases = [
            (EnrollmentError::NotEligible, StatusCode::FORBIDDEN),
            (EnrollmentError::CourseUnavailable, StatusCode::NOT_FOUND),
            (EnrollmentError::AlreadyEnrolled, StatusCode::CONFLICT),
            (EnrollmentError::NotEnrolled, StatusCode::NOT_FOUND),
            (EnrollmentError::LessonNotTracked, StatusCode::NOT_FOUND),
            (EnrollmentError::Conflict, StatusCode::CONFLICT),
        ];
        for (err, expected) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[test]
    fn sqlx_failures_are_internal_errors() {
        let response = AppError::from(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
