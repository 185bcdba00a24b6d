pub mod access_gate;
pub mod blob_store;
pub mod deletion_service;
pub mod file_service;
pub mod folder_service;
pub mod upload_service;

pub use access_gate::AccessGate;
pub use blob_store::{BlobStore, BlobUpload, ByteStream};
pub use deletion_service::DeletionService;
pub use file_service::{Download, FileService};
pub use folder_service::FolderService;
pub use upload_service::{StagedUpload, UploadRequest, UploadService};

use std::future::Future;
use std::time::Duration;

use crate::application::error::{ApplicationError, BlobStoreErrorKind, PersistenceErrorKind};

/// Runs a blob store operation under a deadline.
pub async fn blob_deadline<T, F>(
    limit: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, ApplicationError>
where
    F: Future<Output = Result<T, ApplicationError>>,
{
    tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
        Err(ApplicationError::blob(
            BlobStoreErrorKind::Timeout,
            format!("{operation} exceeded {limit:?}"),
        ))
    })
}

/// Runs a metadata store operation under a deadline.
pub async fn metadata_deadline<T, F>(
    limit: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, ApplicationError>
where
    F: Future<Output = Result<T, ApplicationError>>,
{
    tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
        Err(ApplicationError::persistence(
            PersistenceErrorKind::Timeout,
            format!("{operation} exceeded {limit:?}"),
        ))
    })
}
