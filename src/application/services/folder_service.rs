use std::sync::Arc;

use tracing::info;

use crate::{
    application::{
        dto::folder_dto::NewFolderDTO,
        error::{ApplicationError, ValidationReason},
        repositories::folder_repository::FolderRepository,
        services::metadata_deadline,
    },
    domain::{
        config::storage::Timeouts,
        models::{
            folder::{Folder, FolderSummary},
            subject::Subject,
        },
    },
};

pub const MAX_FOLDER_NAME: usize = 255;

#[derive(Clone)]
pub struct FolderService {
    folders: Arc<dyn FolderRepository>,
    timeouts: Timeouts,
}

impl FolderService {
    pub fn new(folders: Arc<dyn FolderRepository>, timeouts: Timeouts) -> Self {
        Self { folders, timeouts }
    }

    pub async fn create_folder(
        &self,
        subject: &Subject,
        name: &str,
    ) -> Result<Folder, ApplicationError> {
        let dto = NewFolderDTO::new(name, subject.id);
        if dto.name.is_empty() {
            return Err(ApplicationError::Validation(ValidationReason::MissingField(
                "name",
            )));
        }
        if dto.name.chars().count() > MAX_FOLDER_NAME {
            return Err(ApplicationError::BadRequest(format!(
                "folder name longer than {MAX_FOLDER_NAME} characters"
            )));
        }

        let folder = metadata_deadline(
            self.timeouts.metadata,
            "create folder",
            self.folders.create_folder(dto),
        )
        .await?;
        info!("Created folder {} for subject {}", folder.id, subject.id);
        Ok(folder)
    }

    pub async fn list_folders(
        &self,
        subject: &Subject,
    ) -> Result<Vec<FolderSummary>, ApplicationError> {
        metadata_deadline(
            self.timeouts.metadata,
            "list folders",
            self.folders.list_folders(subject.id),
        )
        .await
    }
}
