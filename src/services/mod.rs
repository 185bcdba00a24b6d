mod error;
mod local_disk_storage;
mod memory_storage;
mod s3_storage;

pub use error::{SizeGuard, StorageError};
pub use local_disk_storage::LocalDiskStorageService;
pub use memory_storage::InMemoryBlobStore;
pub use s3_storage::S3StorageService;

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    application::services::BlobStore,
    domain::{
        config::{
            secrets::Secrets,
            storage::{Provider, StorageConfig},
        },
        models::file::extension_of,
    },
};

/// Picks the blob store once at startup.
pub fn create_blob_store(
    storage: &StorageConfig,
    secrets: &Secrets,
    max_bytes: u64,
) -> Result<Arc<dyn BlobStore>, StorageError> {
    match storage.provider {
        Provider::LocalDisk => {
            let service = LocalDiskStorageService::new(&storage.local_root, max_bytes)?;
            Ok(Arc::new(service))
        }
        Provider::RemoteObject => {
            let s3_secrets = secrets.s3_secrets.as_ref().ok_or_else(|| {
                StorageError::InvalidCredentials("S3 secrets not found".to_string())
            })?;

            let service = S3StorageService::new(s3_secrets.clone(), storage, max_bytes)?;
            Ok(Arc::new(service))
        }
    }
}

/// Fresh key for a blob, grouped per owner. The original name only
/// contributes its extension.
pub fn blob_key(owner_id: i64, original_name: &str) -> String {
    let id = Uuid::new_v4();
    match extension_of(original_name) {
        Some(ext) => format!("user_{owner_id}/{id}.{ext}"),
        None => format!("user_{owner_id}/{id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique_and_keep_the_extension() {
        let a = blob_key(3, "holiday.JPEG");
        let b = blob_key(3, "holiday.JPEG");
        assert_ne!(a, b);
        assert!(a.starts_with("user_3/"));
        assert!(a.ends_with(".jpeg"));
        assert!(!blob_key(3, "../../etc/passwd").contains(".."));
    }

    #[test]
    fn remote_store_needs_credentials() {
        let storage = StorageConfig {
            provider: Provider::RemoteObject,
            ..StorageConfig::default()
        };
        let secrets = Secrets {
            database_url: "postgres://localhost/files".into(),
            session_secret: "s".into(),
            s3_secrets: None,
        };
        assert!(matches!(
            create_blob_store(&storage, &secrets, 1024),
            Err(StorageError::InvalidCredentials(_))
        ));
    }

    #[test]
    fn local_store_creates_its_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = StorageConfig {
            local_root: dir.path().join("nested/uploads"),
            ..StorageConfig::default()
        };
        let secrets = Secrets {
            database_url: "postgres://localhost/files".into(),
            session_secret: "s".into(),
            s3_secrets: None,
        };
        let store = create_blob_store(&storage, &secrets, 1024).unwrap();
        assert_eq!(store.provider(), Provider::LocalDisk);
        assert!(dir.path().join("nested/uploads").is_dir());
    }
}
