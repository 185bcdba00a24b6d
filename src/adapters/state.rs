use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    adapters::middleware::SessionKeys,
    application::{
        repositories::{file_repository::FileRepository, folder_repository::FolderRepository},
        services::{BlobStore, DeletionService, FileService, FolderService, UploadService},
    },
    domain::config::{storage::Timeouts, upload::UploadPolicy},
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub upload_policy: UploadPolicy,
    pub session_keys: SessionKeys,
    pub blob_store: Arc<dyn BlobStore>,
    pub upload_service: UploadService,
    pub file_service: FileService,
    pub folder_service: FolderService,
    pub deletion_service: DeletionService,
}

impl AppState {
    /// Wires every service onto the same stores.
    pub fn new(
        upload_policy: UploadPolicy,
        session_keys: SessionKeys,
        blob_store: Arc<dyn BlobStore>,
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        timeouts: Timeouts,
        delete_concurrency: usize,
    ) -> Self {
        Self {
            upload_service: UploadService::new(
                upload_policy.clone(),
                blob_store.clone(),
                folders.clone(),
                files.clone(),
                timeouts,
            ),
            file_service: FileService::new(
                blob_store.clone(),
                folders.clone(),
                files.clone(),
                timeouts,
            ),
            folder_service: FolderService::new(folders.clone(), timeouts),
            deletion_service: DeletionService::new(
                blob_store.clone(),
                folders,
                files,
                timeouts,
                delete_concurrency,
            ),
            upload_policy,
            session_keys,
            blob_store,
        }
    }
}
