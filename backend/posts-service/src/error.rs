/// Error types for posts-service
///
/// Every failure resolves to a normal HTTP response. Handlers that render
/// forms intercept `Validation` and `Forbidden` before they reach
/// `ResponseError`; the mapping below is what direct API callers see.
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use thiserror::Error;
use validator::ValidationErrors;

/// Result type for posts-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing form fields
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// Referenced group, post or user does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not allowed to touch this resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Anonymous caller on a protected route; holds the login redirect target
    #[error("Authentication required")]
    AuthenticationRequired { location: String },

    /// Duplicate resource (group slug)
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::AuthenticationRequired { .. } => StatusCode::FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            AppError::AuthenticationRequired { location } => {
                return HttpResponse::Found()
                    .insert_header((header::LOCATION, location.as_str()))
                    .finish();
            }
            AppError::Validation(errors) => {
                return HttpResponse::build(status).json(serde_json::json!({
                    "error": "validation failed",
                    "errors": errors,
                    "status": status.as_u16(),
                }));
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database operation failed");
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
            }
            _ => {}
        }

        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        }))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let unique_violation = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code == "23505")
            .unwrap_or(false);

        if unique_violation {
            AppError::Conflict(err.to_string())
        } else {
            AppError::Database(err)
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(
            AppError::not_found("post").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("edit".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Conflict("slug".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn authentication_required_redirects() {
        let err = AppError::AuthenticationRequired {
            location: "/auth/login/?next=%2Fcreate%2F".to_string(),
        };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=%2Fcreate%2F"
        );
    }

    #[test]
    fn validation_message_is_displayed() {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("required");
        error.message = Some("text required".into());
        errors.add("text", error);

        let err = AppError::from(errors);
        assert!(err.is_validation());
        assert!(err.to_string().contains("text required"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn server_errors_hide_details() {
        let resp = AppError::Internal("secret detail".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
