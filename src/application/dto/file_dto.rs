use crate::domain::models::file::Locator;

/// Hard cap on listing size.
pub const MAX_LISTING: u32 = 200;

/// Row to insert once the blob has been committed.
#[derive(Debug, Clone)]
pub struct NewFileDTO {
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
    pub locator: Locator,
    pub owner_id: i64,
    pub folder_id: Option<i64>,
}

impl NewFileDTO {
    /// Postgres stores sizes as BIGINT.
    pub fn sanitize(&mut self) {
        self.size = std::cmp::min(self.size, i64::MAX as u64);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileQueryDTO {
    pub owner_id: i64,
    pub folder_id: Option<i64>,
    pub limit: u32,
}

impl FileQueryDTO {
    pub fn for_owner(owner_id: i64) -> Self {
        Self {
            owner_id,
            folder_id: None,
            limit: MAX_LISTING,
        }
    }

    pub fn in_folder(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = folder_id;
        self
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_LISTING)
    }
}
