use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};

use crate::domain::models::file::{File, Locator};

impl FromRow<'_, PgRow> for File {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let size: i64 = row.try_get("size")?;
        let locator: String = row.try_get("locator")?;
        Ok(File {
            id: row.try_get("id")?,
            filename: row.try_get("filename")?,
            original_name: row.try_get("original_name")?,
            mime_type: row.try_get("mime_type")?,
            size: size.max(0) as u64,
            locator: Locator::new(locator),
            owner_id: row.try_get("owner_id")?,
            folder_id: row.try_get("folder_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// File as shown to its owner. The locator stays server-side.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: i64,
    pub filename: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub size: u64,
    #[serde(rename = "folderId")]
    pub folder_id: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
}

impl From<File> for FileResponse {
    fn from(file: File) -> Self {
        Self {
            download_url: format!("/files/{}/download", file.id),
            id: file.id,
            filename: file.filename,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size: file.size,
            folder_id: file.folder_id,
            created_at: file.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileListResponse {
    #[serde(rename = "folderId")]
    pub folder_id: Option<i64>,
    pub count: usize,
    pub files: Vec<FileResponse>,
}

impl FileListResponse {
    pub fn new(folder_id: Option<i64>, files: Vec<File>) -> Self {
        Self {
            folder_id,
            count: files.len(),
            files: files.into_iter().map(FileResponse::from).collect(),
        }
    }
}

/// `?folderId=` is read as text so a malformed value becomes our own
/// `BadRequest` instead of the extractor's rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListFilesQuery {
    #[serde(rename = "folderId")]
    pub folder_id: Option<String>,
}
