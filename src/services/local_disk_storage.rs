use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::{fs, io::AsyncWriteExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::{
    application::{
        error::ApplicationError,
        services::{BlobStore, BlobUpload, ByteStream},
    },
    domain::{
        config::storage::Provider,
        models::file::{Locator, StoredBlob},
    },
    services::{
        blob_key,
        error::{SizeGuard, StorageError},
    },
};

/// Blobs as plain files below a root directory. Locators are paths relative
/// to that root:
/// ```text
/// {root}/
/// ├── user_7/
/// │   ├── 5f0c...e1.pdf
/// │   └── 9a41...07.png
/// └── user_8/
///     └── ...
/// ```
pub struct LocalDiskStorageService {
    root: PathBuf,
    max_bytes: u64,
}

impl LocalDiskStorageService {
    /// The root directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::WriteFailed(format!("cannot create {}: {}", root.display(), e))
        })?;

        Ok(Self { root, max_bytes })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a locator back onto the root, refusing anything that could
    /// escape it.
    fn resolve(&self, locator: &Locator) -> Result<PathBuf, StorageError> {
        let relative = Path::new(locator.as_str());
        let escapes = relative.as_os_str().is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(StorageError::InvalidLocator(locator.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

/// Removes the temporary file unless the write made it to the final rename.
/// Also covers the upload future being dropped mid-stream.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Could not remove partial upload {}: {}", self.path.display(), e);
                }
            }
        }
    }
}

fn partial_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

fn write_failed(context: &str, error: io::Error) -> StorageError {
    StorageError::WriteFailed(format!("{context}: {error}"))
}

#[async_trait]
impl BlobStore for LocalDiskStorageService {
    fn provider(&self) -> Provider {
        Provider::LocalDisk
    }

    async fn put(&self, upload: BlobUpload<'_>) -> Result<StoredBlob, ApplicationError> {
        let mut guard = SizeGuard::new(self.max_bytes, upload.size_hint)?;

        let key = blob_key(upload.owner_id, &upload.original_name);
        let final_path = self.root.join(&key);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| write_failed("create directory", e))?;
        }

        let mut partial = PartialFile {
            path: partial_path_for(&final_path),
            committed: false,
        };
        let mut file = fs::File::create(&partial.path)
            .await
            .map_err(|e| write_failed("create file", e))?;

        let mut content = upload.content;
        while let Some(chunk) = content.next().await {
            let chunk = chunk.map_err(|e| write_failed("upload stream aborted", e))?;
            guard.add(chunk.len())?;
            file.write_all(&chunk)
                .await
                .map_err(|e| write_failed("write chunk", e))?;
        }

        file.flush().await.map_err(|e| write_failed("flush", e))?;
        file.sync_all().await.map_err(|e| write_failed("sync", e))?;
        drop(file);

        fs::rename(&partial.path, &final_path)
            .await
            .map_err(|e| write_failed("commit", e))?;
        partial.committed = true;

        debug!("Stored {} bytes at {}", guard.total(), final_path.display());

        Ok(StoredBlob {
            locator: Locator::new(key),
            size: guard.total(),
        })
    }

    async fn get(&self, locator: &Locator) -> Result<ByteStream<'static>, ApplicationError> {
        let path = self.resolve(locator)?;

        match fs::File::open(&path).await {
            Ok(file) => Ok(ReaderStream::new(file).boxed()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(locator.to_string()).into())
            }
            Err(e) => Err(StorageError::ReadFailed(format!("{}: {}", locator, e)).into()),
        }
    }

    async fn delete(&self, locator: &Locator) -> Result<bool, ApplicationError> {
        let path = self.resolve(locator)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::ProviderError(format!("delete {}: {}", locator, e)).into()),
        }
    }

    async fn resolve_access_url(
        &self,
        _locator: &Locator,
        _download_name: &str,
    ) -> Result<Option<String>, ApplicationError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::stream;
    use tempfile::TempDir;

    use std::time::Duration;

    use super::*;
    use crate::application::error::BlobStoreErrorKind;

    fn setup(max_bytes: u64) -> (TempDir, LocalDiskStorageService) {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalDiskStorageService::new(temp_dir.path().join("blobs"), max_bytes).unwrap();
        (temp_dir, storage)
    }

    fn upload(chunks: Vec<io::Result<Bytes>>, size_hint: Option<u64>) -> BlobUpload<'static> {
        BlobUpload {
            owner_id: 7,
            original_name: "Report.PDF".into(),
            mime_type: "application/pdf".into(),
            size_hint,
            content: stream::iter(chunks).boxed(),
        }
    }

    async fn read_all(mut content: ByteStream<'static>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = content.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    fn files_under(dir: &Path) -> usize {
        let mut count = 0;
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count += files_under(&path);
            } else {
                count += 1;
            }
        }
        count
    }

    #[tokio::test]
    async fn test_put_and_get_round_trip() {
        let (_dir, storage) = setup(1024);
        let chunks = vec![Ok(Bytes::from_static(b"%PDF-")), Ok(Bytes::from_static(b"1.7"))];

        let stored = storage.put(upload(chunks, Some(8))).await.unwrap();

        assert_eq!(stored.size, 8);
        assert!(stored.locator.as_str().starts_with("user_7/"));
        assert!(stored.locator.as_str().ends_with(".pdf"));
        let content = storage.get(&stored.locator).await.unwrap();
        assert_eq!(read_all(content).await, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_oversized_hint_fails_before_touching_disk() {
        let (_dir, storage) = setup(4);
        let err = storage
            .put(upload(vec![Ok(Bytes::from_static(b"hello"))], Some(5)))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "TooLarge");
        assert_eq!(files_under(storage.root()), 0);
    }

    #[tokio::test]
    async fn test_stream_longer_than_limit_leaves_nothing_behind() {
        let (_dir, storage) = setup(4);
        let chunks = vec![Ok(Bytes::from_static(b"abc")), Ok(Bytes::from_static(b"def"))];

        let err = storage.put(upload(chunks, Some(3))).await.unwrap_err();

        assert_eq!(err.code(), "TooLarge");
        assert_eq!(files_under(storage.root()), 0);
    }

    #[tokio::test]
    async fn test_aborted_stream_is_write_failure() {
        let (_dir, storage) = setup(1024);
        let chunks = vec![
            Ok(Bytes::from_static(b"abc")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
        ];

        let err = storage.put(upload(chunks, None)).await.unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::BlobStore {
                kind: BlobStoreErrorKind::WriteFailed,
                ..
            }
        ));
        assert_eq!(files_under(storage.root()), 0);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, storage) = setup(1024);
        let stored = storage
            .put(upload(vec![Ok(Bytes::from_static(b"x"))], None))
            .await
            .unwrap();

        assert!(storage.delete(&stored.locator).await.unwrap());
        assert!(!storage.delete(&stored.locator).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_blob_is_not_found() {
        let (_dir, storage) = setup(1024);
        let err = storage
            .get(&Locator::new("user_7/missing.pdf"))
            .await
            .err()
            .expect("missing blob");

        assert!(matches!(
            err,
            ApplicationError::BlobStore {
                kind: BlobStoreErrorKind::NotFound,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_locators_cannot_escape_root() {
        let (_dir, storage) = setup(1024);

        for locator in ["../secret", "/etc/passwd", "user_7/../../x", ""] {
            assert!(storage.get(&Locator::new(locator)).await.is_err());
            assert!(storage.delete(&Locator::new(locator)).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_no_direct_url_for_local_disk() {
        let (_dir, storage) = setup(1024);
        let url = storage
            .resolve_access_url(&Locator::new("user_7/a.pdf"), "a.pdf")
            .await
            .unwrap();
        assert!(url.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_put_leaves_nothing_behind() {
        let (_dir, storage) = setup(1024);
        let stalled = stream::iter(vec![Ok(Bytes::from_static(b"%PDF-1.7"))])
            .chain(stream::pending())
            .boxed();
        let upload = BlobUpload {
            owner_id: 7,
            original_name: "Report.PDF".into(),
            mime_type: "application/pdf".into(),
            size_hint: None,
            content: stalled,
        };

        let put = tokio::time::timeout(Duration::from_millis(50), storage.put(upload)).await;

        assert!(put.is_err());
        assert_eq!(files_under(&storage.root), 0);
    }
}
