use crate::domain::models::file::Locator;

/// What happened to one blob while a folder was being torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobOutcome {
    Deleted,
    NotFoundOnBackend,
    BackendError { detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobDeletion {
    pub file_id: i64,
    pub locator: Locator,
    pub outcome: BlobOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub folders_deleted: u64,
    pub files_deleted: u64,
    pub blobs: Vec<BlobDeletion>,
}

impl DeletionReport {
    pub fn blob_failures(&self) -> impl Iterator<Item = &BlobDeletion> {
        self.blobs
            .iter()
            .filter(|b| matches!(b.outcome, BlobOutcome::BackendError { .. }))
    }

    pub fn count(&self, wanted: fn(&BlobOutcome) -> bool) -> usize {
        self.blobs.iter().filter(|b| wanted(&b.outcome)).count()
    }

    pub fn deleted_blobs(&self) -> usize {
        self.count(|o| matches!(o, BlobOutcome::Deleted))
    }

    pub fn missing_blobs(&self) -> usize {
        self.count(|o| matches!(o, BlobOutcome::NotFoundOnBackend))
    }
}
