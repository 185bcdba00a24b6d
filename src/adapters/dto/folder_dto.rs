use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};

use crate::domain::models::folder::{Folder, FolderSummary};

impl FromRow<'_, PgRow> for Folder {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Folder {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            owner_id: row.try_get("owner_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl FromRow<'_, PgRow> for FolderSummary {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let file_count: i64 = row.try_get("file_count")?;
        Ok(FolderSummary {
            folder: Folder::from_row(row)?,
            file_count: file_count.max(0) as u64,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateFolderRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FolderResponse {
    pub id: i64,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "fileCount")]
    pub file_count: u64,
}

impl From<FolderSummary> for FolderResponse {
    fn from(summary: FolderSummary) -> Self {
        Self {
            id: summary.folder.id,
            name: summary.folder.name,
            created_at: summary.folder.created_at,
            file_count: summary.file_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FolderListResponse {
    pub count: usize,
    pub folders: Vec<FolderResponse>,
}

impl From<Vec<FolderSummary>> for FolderListResponse {
    fn from(summaries: Vec<FolderSummary>) -> Self {
        Self {
            count: summaries.len(),
            folders: summaries.into_iter().map(FolderResponse::from).collect(),
        }
    }
}
