use async_trait::async_trait;
use sqlx::query_as;

use crate::{
    adapters::repositories::db_error,
    application::{
        dto::folder_dto::NewFolderDTO, error::ApplicationError,
        repositories::folder_repository::FolderRepository,
    },
    domain::models::folder::{Folder, FolderSummary},
};

pub struct PgFolderRepository {
    pool: sqlx::PgPool,
}

impl PgFolderRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for PgFolderRepository {
    async fn create_folder(&self, folder: NewFolderDTO) -> Result<Folder, ApplicationError> {
        let query = r#"
            INSERT INTO application.folders (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, created_at
        "#;

        query_as::<_, Folder>(query)
            .bind(&folder.name)
            .bind(folder.owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn get_folder(&self, folder_id: i64) -> Result<Option<Folder>, ApplicationError> {
        let query = "SELECT id, name, owner_id, created_at FROM application.folders WHERE id = $1";

        query_as::<_, Folder>(query)
            .bind(folder_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn list_folders(&self, owner_id: i64) -> Result<Vec<FolderSummary>, ApplicationError> {
        let query = r#"
            SELECT f.id, f.name, f.owner_id, f.created_at, COUNT(fi.id) AS file_count
            FROM application.folders f
            LEFT JOIN application.files fi ON fi.folder_id = f.id
            WHERE f.owner_id = $1
            GROUP BY f.id
            ORDER BY f.created_at DESC, f.id DESC
        "#;

        query_as::<_, FolderSummary>(query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn delete_folder_cascade(&self, folder_id: i64) -> Result<u64, ApplicationError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let files = sqlx::query("DELETE FROM application.files WHERE folder_id = $1")
            .bind(folder_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        sqlx::query("DELETE FROM application.folders WHERE id = $1")
            .bind(folder_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        Ok(files.rows_affected())
    }
}
