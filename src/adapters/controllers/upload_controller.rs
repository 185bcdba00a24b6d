use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
};
use futures::{StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::{
    adapters::{controllers::parse_id, error::Flash, middleware::AuthenticatedSubject},
    application::{
        error::{ApplicationError, ValidationReason},
        services::{UploadRequest, UploadService},
    },
};

pub const UPLOAD_FORM_PATH: &str = "/upload";

pub struct UploadController;

impl UploadController {
    /// POST /upload
    ///
    /// Multipart form with a single `file` part. `folderId` and an optional
    /// `size` (declared byte count) must come before it; the file part is
    /// streamed straight to the blob store. Either field arriving after the
    /// file is a `BadRequest` and the stored bytes are dropped.
    pub async fn upload_file(
        State(uploads): State<UploadService>,
        AuthenticatedSubject(subject): AuthenticatedSubject,
        mut multipart: Multipart,
    ) -> Flash {
        let mut folder_id: Option<i64> = None;
        let mut declared_size: Option<u64> = None;
        let body_limit_hit = AtomicBool::new(false);

        let result = loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => {
                    break Err(ApplicationError::Validation(ValidationReason::MissingField(
                        "file",
                    )))
                }
                Err(e) => {
                    warn!("Invalid multipart data: {}", e);
                    break Err(multipart_failure(&e));
                }
            };

            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "folderId" => {
                    let raw = match field.text().await {
                        Ok(raw) => raw,
                        Err(e) => break Err(ApplicationError::BadRequest(e.to_string())),
                    };
                    if !raw.trim().is_empty() {
                        match parse_id(&raw, "folder") {
                            Ok(id) => folder_id = Some(id),
                            Err(e) => break Err(e),
                        }
                    }
                }
                "size" => {
                    let raw = match field.text().await {
                        Ok(raw) => raw,
                        Err(e) => break Err(ApplicationError::BadRequest(e.to_string())),
                    };
                    match raw.trim().parse::<u64>() {
                        Ok(size) => declared_size = Some(size),
                        Err(_) => {
                            break Err(ApplicationError::BadRequest(format!(
                                "Invalid size: {raw}"
                            )))
                        }
                    }
                }
                "file" => {
                    let original_name = field.file_name().unwrap_or_default().to_string();
                    let declared_mime = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();

                    info!(
                        "Upload of {:?} ({}) by subject {} started",
                        original_name, declared_mime, subject.id
                    );

                    let request = UploadRequest {
                        original_name,
                        declared_mime,
                        declared_size,
                        folder_id,
                        content: field
                            .map_err(|e| {
                                if exceeds_body_limit(&e) {
                                    body_limit_hit.store(true, Ordering::Relaxed);
                                }
                                io::Error::other(e)
                            })
                            .boxed(),
                    };
                    let staged = match uploads.stage(&subject, request).await {
                        Err(ApplicationError::BlobStore { .. })
                            if body_limit_hit.load(Ordering::Relaxed) =>
                        {
                            Err(ApplicationError::Validation(ValidationReason::TooLarge))
                        }
                        other => other,
                    };
                    break match staged {
                        Ok(staged) => match reject_late_fields(&mut multipart).await {
                            Ok(()) => uploads.record(&subject, staged).await,
                            Err(e) => {
                                uploads.discard(staged).await;
                                Err(e)
                            }
                        },
                        Err(e) => Err(e),
                    };
                }
                _ => {}
            }
        };

        match result {
            Ok(_) => {
                let listing = match folder_id {
                    Some(id) => format!("/files?folderId={id}"),
                    None => "/files".to_string(),
                };
                Flash::success(&listing, "Uploaded")
            }
            Err(e) => Flash::error(UPLOAD_FORM_PATH, &e),
        }
    }
}

/// Drains the parts after the file. Filing fields that show up this late
/// can no longer be honoured.
async fn reject_late_fields(multipart: &mut Multipart) -> Result<(), ApplicationError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_failure(&e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "folderId" && name != "size" {
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| ApplicationError::BadRequest(e.to_string()))?;
        if !value.trim().is_empty() {
            return Err(ApplicationError::BadRequest(format!(
                "{name} must come before the file part"
            )));
        }
    }
    Ok(())
}

fn exceeds_body_limit(error: &MultipartError) -> bool {
    error.status() == StatusCode::PAYLOAD_TOO_LARGE
}

fn multipart_failure(error: &MultipartError) -> ApplicationError {
    if exceeds_body_limit(error) {
        ApplicationError::Validation(ValidationReason::TooLarge)
    } else {
        ApplicationError::BadRequest("Invalid request format".to_string())
    }
}
