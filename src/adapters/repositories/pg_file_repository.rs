use async_trait::async_trait;
use sqlx::query_as;

use crate::{
    adapters::repositories::db_error,
    application::{
        dto::file_dto::{FileQueryDTO, NewFileDTO},
        error::ApplicationError,
        repositories::file_repository::FileRepository,
    },
    domain::models::file::File,
};

const FILE_COLUMNS: &str =
    "id, filename, original_name, mime_type, size, locator, owner_id, folder_id, created_at";

pub struct PgFileRepository {
    pool: sqlx::PgPool,
}

impl PgFileRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn create_file(&self, file: NewFileDTO) -> Result<File, ApplicationError> {
        let mut file = file;
        file.sanitize();

        let query = format!(
            r#"
            INSERT INTO application.files (
                filename, original_name, mime_type, size, locator, owner_id, folder_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FILE_COLUMNS}
        "#
        );

        query_as::<_, File>(&query)
            .bind(&file.filename)
            .bind(&file.original_name)
            .bind(&file.mime_type)
            .bind(file.size as i64)
            .bind(file.locator.as_str())
            .bind(file.owner_id)
            .bind(file.folder_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn get_file(&self, file_id: i64) -> Result<Option<File>, ApplicationError> {
        let query = format!("SELECT {FILE_COLUMNS} FROM application.files WHERE id = $1");

        query_as::<_, File>(&query)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn list_files(&self, query: FileQueryDTO) -> Result<Vec<File>, ApplicationError> {
        let sql = format!(
            r#"
            SELECT {FILE_COLUMNS} FROM application.files
            WHERE owner_id = $1 AND ($2::BIGINT IS NULL OR folder_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
        "#
        );

        query_as::<_, File>(&sql)
            .bind(query.owner_id)
            .bind(query.folder_id)
            .bind(query.effective_limit() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn list_files_in_folder(&self, folder_id: i64) -> Result<Vec<File>, ApplicationError> {
        let query = format!("SELECT {FILE_COLUMNS} FROM application.files WHERE folder_id = $1");

        query_as::<_, File>(&query)
            .bind(folder_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }
}
