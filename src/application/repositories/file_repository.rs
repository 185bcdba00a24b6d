use async_trait::async_trait;

use crate::{
    application::{
        dto::file_dto::{FileQueryDTO, NewFileDTO},
        error::ApplicationError,
    },
    domain::models::file::File,
};

#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn create_file(&self, file: NewFileDTO) -> Result<File, ApplicationError>;
    async fn get_file(&self, file_id: i64) -> Result<Option<File>, ApplicationError>;
    /// Owner-scoped, newest first, capped at the query limit.
    async fn list_files(&self, query: FileQueryDTO) -> Result<Vec<File>, ApplicationError>;
    async fn list_files_in_folder(&self, folder_id: i64) -> Result<Vec<File>, ApplicationError>;
}
