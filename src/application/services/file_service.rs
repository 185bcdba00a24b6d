use std::sync::Arc;

use tracing::debug;

use crate::{
    application::{
        dto::file_dto::FileQueryDTO,
        error::ApplicationError,
        repositories::{file_repository::FileRepository, folder_repository::FolderRepository},
        services::{blob_deadline, metadata_deadline, AccessGate, BlobStore, ByteStream},
    },
    domain::{
        config::storage::Timeouts,
        models::{file::File, subject::Subject},
    },
};

/// How a download is served.
pub enum Download {
    /// The backend hands out a URL the client can fetch itself.
    Redirect(String),
    /// Bytes go through this service.
    Stream {
        file: File,
        content: ByteStream<'static>,
    },
}

#[derive(Clone)]
pub struct FileService {
    blob_store: Arc<dyn BlobStore>,
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
    timeouts: Timeouts,
}

impl FileService {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        folders: Arc<dyn FolderRepository>,
        files: Arc<dyn FileRepository>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            blob_store,
            folders,
            files,
            timeouts,
        }
    }

    /// The subject's files, newest first. Listing a folder requires owning it.
    pub async fn list_files(
        &self,
        subject: &Subject,
        folder_id: Option<i64>,
    ) -> Result<Vec<File>, ApplicationError> {
        if let Some(folder_id) = folder_id {
            let folder = metadata_deadline(
                self.timeouts.metadata,
                "load folder",
                self.folders.get_folder(folder_id),
            )
            .await?;
            AccessGate::visible(subject, folder)?;
        }

        let query = FileQueryDTO::for_owner(subject.id).in_folder(folder_id);
        metadata_deadline(
            self.timeouts.metadata,
            "list files",
            self.files.list_files(query),
        )
        .await
    }

    pub async fn get_file(&self, subject: &Subject, file_id: i64) -> Result<File, ApplicationError> {
        let file = metadata_deadline(
            self.timeouts.metadata,
            "load file",
            self.files.get_file(file_id),
        )
        .await?;
        AccessGate::visible(subject, file)
    }

    pub async fn open_download(
        &self,
        subject: &Subject,
        file_id: i64,
    ) -> Result<Download, ApplicationError> {
        let file = self.get_file(subject, file_id).await?;

        let url = blob_deadline(
            self.timeouts.blob,
            "resolve access url",
            self.blob_store
                .resolve_access_url(&file.locator, &file.original_name),
        )
        .await?;
        if let Some(url) = url {
            debug!("Redirecting download of file {} to backend", file.id);
            return Ok(Download::Redirect(url));
        }

        let content = blob_deadline(
            self.timeouts.blob,
            "blob get",
            self.blob_store.get(&file.locator),
        )
        .await?;
        Ok(Download::Stream { file, content })
    }
}
