use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    application::{
        dto::file_dto::NewFileDTO,
        error::{ApplicationError, ValidationReason},
        repositories::{file_repository::FileRepository, folder_repository::FolderRepository},
        services::{blob_deadline, metadata_deadline, AccessGate, BlobStore, BlobUpload, ByteStream},
    },
    domain::{
        config::{
            storage::Timeouts,
            upload::{normalize_mime, UploadPolicy},
        },
        models::{
            file::{sanitize_filename, File, Locator},
            subject::Subject,
        },
    },
};

/// One upload as it arrives from the transport.
pub struct UploadRequest<'a> {
    pub original_name: String,
    pub declared_mime: String,
    /// Size announced by the client, if any. The stream is counted regardless.
    pub declared_size: Option<u64>,
    pub folder_id: Option<i64>,
    pub content: ByteStream<'a>,
}

/// A blob that made it to the store but has no file row yet.
#[derive(Debug)]
pub struct StagedUpload {
    original_name: String,
    mime_type: String,
    folder_id: Option<i64>,
    locator: Locator,
    size: u64,
}

/// Validate, commit the blob, then record the file row.
#[derive(Clone)]
pub struct UploadService {
    policy: UploadPolicy,
    blob_store: Arc<dyn BlobStore>,
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
    timeouts: Timeouts,
}

impl UploadService {
    pub fn new(
        policy: UploadPolicy,
        blob_store: Arc<dyn BlobStore>,
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            policy,
            blob_store,
            folders,
            files,
            timeouts,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Checks that need no I/O at all.
    pub fn validate(
        &self,
        original_name: &str,
        declared_mime: &str,
        declared_size: Option<u64>,
    ) -> Result<(), ApplicationError> {
        if original_name.trim().is_empty() {
            return Err(ApplicationError::Validation(ValidationReason::MissingField(
                "file",
            )));
        }
        if !self.policy.allows_mime(declared_mime) {
            return Err(ApplicationError::Validation(ValidationReason::InvalidType));
        }
        if declared_size.is_some_and(|size| self.policy.exceeds(size)) {
            return Err(ApplicationError::Validation(ValidationReason::TooLarge));
        }
        Ok(())
    }

    pub async fn submit(
        &self,
        subject: &Subject,
        request: UploadRequest<'_>,
    ) -> Result<File, ApplicationError> {
        let staged = self.stage(subject, request).await?;
        self.record(subject, staged).await
    }

    /// Validation, folder ownership and the blob write. Nothing is visible
    /// until the result goes through [`UploadService::record`].
    pub async fn stage(
        &self,
        subject: &Subject,
        request: UploadRequest<'_>,
    ) -> Result<StagedUpload, ApplicationError> {
        let UploadRequest {
            original_name,
            declared_mime,
            declared_size,
            folder_id,
            content,
        } = request;

        self.validate(&original_name, &declared_mime, declared_size)?;

        if let Some(folder_id) = folder_id {
            let folder = metadata_deadline(
                self.timeouts.metadata,
                "load folder",
                self.folders.get_folder(folder_id),
            )
            .await?;

            match folder {
                Some(folder) => AccessGate::require_owner(subject, &folder)?,
                None => {
                    warn!(
                        "Subject {} tried to upload into missing folder {}",
                        subject.id, folder_id
                    );
                    return Err(ApplicationError::Permission);
                }
            }
        }

        let mime_type = normalize_mime(&declared_mime);
        let upload = BlobUpload {
            owner_id: subject.id,
            original_name: original_name.clone(),
            mime_type: mime_type.clone(),
            size_hint: declared_size,
            content,
        };

        let stored =
            blob_deadline(self.timeouts.blob, "blob put", self.blob_store.put(upload)).await?;

        Ok(StagedUpload {
            original_name,
            mime_type,
            folder_id,
            locator: stored.locator,
            size: stored.size,
        })
    }

    /// Records the file row for a committed blob. A failure here orphans the blob.
    pub async fn record(
        &self,
        subject: &Subject,
        staged: StagedUpload,
    ) -> Result<File, ApplicationError> {
        let mut new_file = NewFileDTO {
            filename: sanitize_filename(&staged.original_name),
            original_name: staged.original_name,
            mime_type: staged.mime_type,
            size: staged.size,
            locator: staged.locator.clone(),
            owner_id: subject.id,
            folder_id: staged.folder_id,
        };
        new_file.sanitize();

        match metadata_deadline(
            self.timeouts.metadata,
            "insert file",
            self.files.create_file(new_file),
        )
        .await
        {
            Ok(file) => {
                info!(
                    "Stored file {} ({} bytes, {}) for subject {}",
                    file.id, file.size, file.mime_type, subject.id
                );
                Ok(file)
            }
            Err(e) => {
                error!(
                    "Orphaned blob {} on {}: metadata insert failed: {}",
                    staged.locator,
                    self.blob_store.provider().as_str(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Drops a staged blob whose request was rejected after the bytes landed.
    pub async fn discard(&self, staged: StagedUpload) {
        let removed = blob_deadline(
            self.timeouts.blob,
            "blob delete",
            self.blob_store.delete(&staged.locator),
        )
        .await;
        if let Err(e) = removed {
            error!("Orphaned blob {} after rejected upload: {}", staged.locator, e);
        }
    }
}
