use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::subject::Owned;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    #[serde(rename = "ownerId")]
    pub owner_id: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Owned for Folder {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

/// Folder row together with the number of files filed under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderSummary {
    #[serde(flatten)]
    pub folder: Folder,
    #[serde(rename = "fileCount")]
    pub file_count: u64,
}
