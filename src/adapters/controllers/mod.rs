pub mod file_controller;
pub mod folder_controller;
pub mod health_controller;
pub mod upload_controller;

use crate::application::error::ApplicationError;

/// Ids arrive as text in paths, queries and forms.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, ApplicationError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApplicationError::BadRequest(format!("Invalid {what} id: {raw}")))
}
