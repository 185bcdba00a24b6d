use std::sync::Arc;
use std::time::Duration;

use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{error, info};

use crate::{
    application::{
        error::{ApplicationError, BlobStoreErrorKind},
        repositories::{file_repository::FileRepository, folder_repository::FolderRepository},
        services::{blob_deadline, metadata_deadline, AccessGate, BlobStore},
    },
    domain::{
        config::storage::Timeouts,
        models::{
            deletion::{BlobDeletion, BlobOutcome, DeletionReport},
            file::File,
            subject::Subject,
        },
    },
};

/// Folder teardown: best-effort blob removal, then one atomic metadata cascade.
#[derive(Clone)]
pub struct DeletionService {
    blob_store: Arc<dyn BlobStore>,
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
    timeouts: Timeouts,
    concurrency: usize,
}

impl DeletionService {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        timeouts: Timeouts,
        concurrency: usize,
    ) -> Self {
        Self {
            blob_store,
            folders,
            files,
            timeouts,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn delete_folder(
        &self,
        subject: &Subject,
        folder_id: i64,
    ) -> Result<DeletionReport, ApplicationError> {
        let folder = metadata_deadline(
            self.timeouts.metadata,
            "load folder",
            self.folders.get_folder(folder_id),
        )
        .await?
        .ok_or(ApplicationError::NotFound)?;

        AccessGate::require_owner(subject, &folder)?;

        let children = metadata_deadline(
            self.timeouts.metadata,
            "list folder files",
            self.files.list_files_in_folder(folder_id),
        )
        .await?;

        let blobs = self.remove_blobs(children).await;

        let files_deleted = metadata_deadline(
            self.timeouts.metadata,
            "delete folder",
            self.folders.delete_folder_cascade(folder_id),
        )
        .await?;

        let report = DeletionReport {
            folders_deleted: 1,
            files_deleted,
            blobs,
        };

        info!(
            "Deleted folder {} of subject {}: {} files, {} blobs removed, {} already gone, {} failed",
            folder_id,
            subject.id,
            report.files_deleted,
            report.deleted_blobs(),
            report.missing_blobs(),
            report.blob_failures().count()
        );

        Ok(report)
    }

    /// Deletes every blob, at most `concurrency` at a time. Every file gets
    /// an outcome, including ones whose task died.
    async fn remove_blobs(&self, files: Vec<File>) -> Vec<BlobDeletion> {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for file in files.iter().cloned() {
            let permits = permits.clone();
            let blob_store = self.blob_store.clone();
            let limit = self.timeouts.blob;
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                remove_blob(blob_store, limit, file).await
            });
        }

        let mut blobs = Vec::with_capacity(files.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(deletion) => blobs.push(deletion),
                Err(e) => error!("Blob deletion task failed: {}", e),
            }
        }

        for file in files {
            if !blobs.iter().any(|b| b.file_id == file.id) {
                blobs.push(BlobDeletion {
                    file_id: file.id,
                    locator: file.locator,
                    outcome: BlobOutcome::BackendError {
                        detail: "deletion task aborted".to_string(),
                    },
                });
            }
        }
        blobs
    }
}

async fn remove_blob(
    blob_store: Arc<dyn BlobStore>,
    limit: Duration,
    file: File,
) -> BlobDeletion {
    let result = blob_deadline(limit, "blob delete", blob_store.delete(&file.locator)).await;

    let outcome = match result {
        Ok(true) => BlobOutcome::Deleted,
        Ok(false)
        | Err(ApplicationError::BlobStore {
            kind: BlobStoreErrorKind::NotFound,
            ..
        }) => BlobOutcome::NotFoundOnBackend,
        Err(e) => {
            error!(
                "Could not delete blob {} of file {}: {}",
                file.locator, file.id, e
            );
            BlobOutcome::BackendError {
                detail: e.to_string(),
            }
        }
    };

    BlobDeletion {
        file_id: file.id,
        locator: file.locator,
        outcome,
    }
}
