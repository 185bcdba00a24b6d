use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::application::error::{ApplicationError, ValidationReason};

impl ApplicationError {
    fn log(&self) {
        if self.is_internal() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }
    }
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        self.log();

        let (status, error_message) = match self {
            ApplicationError::Validation(ValidationReason::TooLarge) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "File too large".to_string())
            }
            ApplicationError::Validation(ValidationReason::InvalidType) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "File type not allowed".to_string(),
            ),
            ApplicationError::Validation(ValidationReason::MissingField(field)) => (
                StatusCode::BAD_REQUEST,
                format!("Missing required field: {field}"),
            ),
            ApplicationError::Permission => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApplicationError::NotFound => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            ApplicationError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            ApplicationError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request".to_string()),
            ApplicationError::BlobStore { .. } | ApplicationError::Persistence { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Post/redirect/get outcome: the page to land on plus a short indicator in
/// the query string (`?success=...` or `?error=<code>`).
#[derive(Debug)]
pub struct Flash {
    location: String,
}

impl Flash {
    pub fn success(path: &str, message: &str) -> Self {
        Self {
            location: with_param(path, "success", message),
        }
    }

    /// Logs the error and points the client at `path` with its code.
    pub fn error(path: &str, error: &ApplicationError) -> Self {
        error.log();
        Self {
            location: with_param(path, "error", error.code()),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

impl IntoResponse for Flash {
    fn into_response(self) -> Response {
        Redirect::to(&self.location).into_response()
    }
}

fn with_param(path: &str, key: &str, value: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={value}")
}

#[cfg(test)]
mod tests {
    use axum::http::header;

    use super::*;

    #[test]
    fn flash_appends_indicator() {
        assert_eq!(Flash::success("/files", "Uploaded").location(), "/files?success=Uploaded");
        assert_eq!(
            Flash::success("/files?folderId=3", "Uploaded").location(),
            "/files?folderId=3&success=Uploaded"
        );
        assert_eq!(
            Flash::error("/upload", &ApplicationError::Validation(ValidationReason::TooLarge))
                .location(),
            "/upload?error=TooLarge"
        );
    }

    #[test]
    fn flash_is_a_see_other_redirect() {
        let response = Flash::error("/files", &ApplicationError::NotFound).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/files?error=NotFound"
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = ApplicationError::persistence(
            crate::application::error::PersistenceErrorKind::WriteFailed,
            "password authentication failed",
        )
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
