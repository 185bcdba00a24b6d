use async_trait::async_trait;

use crate::{
    application::{dto::folder_dto::NewFolderDTO, error::ApplicationError},
    domain::models::folder::{Folder, FolderSummary},
};

#[async_trait]
pub trait FolderRepository: Send + Sync {
    async fn create_folder(&self, folder: NewFolderDTO) -> Result<Folder, ApplicationError>;
    async fn get_folder(&self, folder_id: i64) -> Result<Option<Folder>, ApplicationError>;
    /// Newest first.
    async fn list_folders(&self, owner_id: i64) -> Result<Vec<FolderSummary>, ApplicationError>;
    /// Removes every file row filed under the folder, then the folder row,
    /// as one atomic unit. Returns the number of file rows removed.
    async fn delete_folder_cascade(&self, folder_id: i64) -> Result<u64, ApplicationError>;
}
