use thiserror::Error;

use crate::application::error::{ApplicationError, BlobStoreErrorKind, ValidationReason};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Storage provider error: {0}")]
    ProviderError(String),
}

impl From<StorageError> for ApplicationError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(locator) => {
                ApplicationError::blob(BlobStoreErrorKind::NotFound, locator)
            }
            StorageError::TooLarge { .. } => {
                ApplicationError::Validation(ValidationReason::TooLarge)
            }
            StorageError::Timeout(msg) => ApplicationError::blob(BlobStoreErrorKind::Timeout, msg),
            StorageError::WriteFailed(msg) => {
                ApplicationError::blob(BlobStoreErrorKind::WriteFailed, msg)
            }
            StorageError::ReadFailed(msg)
            | StorageError::NetworkError(msg)
            | StorageError::InvalidCredentials(msg)
            | StorageError::InvalidLocator(msg)
            | StorageError::ProviderError(msg) => {
                ApplicationError::blob(BlobStoreErrorKind::Unavailable, msg)
            }
        }
    }
}

/// Running byte count for an upload, checked against the ceiling as chunks
/// arrive.
#[derive(Debug, Clone, Copy)]
pub struct SizeGuard {
    limit: u64,
    total: u64,
}

impl SizeGuard {
    /// Refuses up front when the declared size is already over the limit.
    pub fn new(limit: u64, size_hint: Option<u64>) -> Result<Self, StorageError> {
        if size_hint.is_some_and(|hint| hint > limit) {
            return Err(StorageError::TooLarge { limit });
        }
        Ok(Self { limit, total: 0 })
    }

    pub fn add(&mut self, chunk_len: usize) -> Result<(), StorageError> {
        self.total = self.total.saturating_add(chunk_len as u64);
        if self.total > self.limit {
            return Err(StorageError::TooLarge { limit: self.limit });
        }
        Ok(())
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_rejects_oversized_hint_before_any_bytes() {
        assert!(matches!(
            SizeGuard::new(10, Some(11)),
            Err(StorageError::TooLarge { limit: 10 })
        ));
        assert!(SizeGuard::new(10, Some(10)).is_ok());
        assert!(SizeGuard::new(10, None).is_ok());
    }

    #[test]
    fn guard_trips_once_running_total_crosses_limit() {
        let mut guard = SizeGuard::new(10, Some(4)).unwrap();
        guard.add(6).unwrap();
        guard.add(4).unwrap();
        assert_eq!(guard.total(), 10);
        assert!(guard.add(1).is_err());
    }

    #[test]
    fn too_large_maps_to_validation_error() {
        let err: ApplicationError = StorageError::TooLarge { limit: 1 }.into();
        assert_eq!(err.code(), "TooLarge");

        let err: ApplicationError = StorageError::NotFound("a/b".into()).into();
        assert!(matches!(
            err,
            ApplicationError::BlobStore {
                kind: BlobStoreErrorKind::NotFound,
                ..
            }
        ));
    }
}
