//! In-memory blob store for tests and local experiments.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt};

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

/// Keeps blobs in a map. With a public base URL it behaves like a remote
/// object store and hands out direct links.
#[derive(Clone)]
pub struct InMemoryBlobStore {
    inner: Arc<Inner>,
}

struct Inner {
    max_bytes: u64,
    public_base_url: Option<String>,
    blobs: RwLock<HashMap<String, Bytes>>,
    failing_deletes: RwLock<HashSet<String>>,
    fail_puts: AtomicBool,
    put_attempts: AtomicUsize,
}

impl InMemoryBlobStore {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                max_bytes,
                public_base_url: None,
                blobs: RwLock::new(HashMap::new()),
                failing_deletes: RwLock::new(HashSet::new()),
                fail_puts: AtomicBool::new(false),
                put_attempts: AtomicUsize::new(0),
            }),
        }
    }

    pub fn with_public_base_url(max_bytes: u64, base_url: impl Into<String>) -> Self {
        let mut store = Self::new(max_bytes);
        if let Some(inner) = Arc::get_mut(&mut store.inner) {
            inner.public_base_url = Some(base_url.into().trim_end_matches('/').to_string());
        }
        store
    }

    /// Makes every following `put` fail after draining its stream.
    pub fn fail_puts(&self, fail: bool) {
        self.inner.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Makes `delete` of this locator fail with a backend error.
    pub fn fail_delete_of(&self, locator: &Locator) {
        self.inner
            .failing_deletes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(locator.as_str().to_string());
    }

    /// Drops a blob behind the metadata store's back.
    pub fn evict(&self, locator: &Locator) -> bool {
        self.inner
            .blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(locator.as_str())
            .is_some()
    }

    pub fn contains(&self, locator: &Locator) -> bool {
        self.inner
            .blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(locator.as_str())
    }

    pub fn len(&self) -> usize {
        self.inner
            .blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `put` calls that got past the size hint check.
    pub fn put_attempts(&self) -> usize {
        self.inner.put_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn provider(&self) -> Provider {
        if self.inner.public_base_url.is_some() {
            Provider::RemoteObject
        } else {
            Provider::LocalDisk
        }
    }

    async fn put(&self, upload: BlobUpload<'_>) -> Result<StoredBlob, ApplicationError> {
        let mut guard = SizeGuard::new(self.inner.max_bytes, upload.size_hint)?;
        self.inner.put_attempts.fetch_add(1, Ordering::SeqCst);

        let mut content = upload.content;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = content.next().await {
            let chunk = chunk.map_err(|e| StorageError::WriteFailed(e.to_string()))?;
            guard.add(chunk.len())?;
            buffer.extend_from_slice(&chunk);
        }

        if self.inner.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed("injected put failure".to_string()).into());
        }

        let key = blob_key(upload.owner_id, &upload.original_name);
        self.inner
            .blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), buffer.freeze());

        Ok(StoredBlob {
            locator: Locator::new(key),
            size: guard.total(),
        })
    }

    async fn get(&self, locator: &Locator) -> Result<ByteStream<'static>, ApplicationError> {
        let bytes = self
            .inner
            .blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locator.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(locator.to_string()))?;

        Ok(stream::once(async move { Ok(bytes) }).boxed())
    }

    async fn delete(&self, locator: &Locator) -> Result<bool, ApplicationError> {
        let failing = self
            .inner
            .failing_deletes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(locator.as_str());
        if failing {
            return Err(StorageError::NetworkError(format!("injected delete failure for {locator}")).into());
        }

        Ok(self.evict(locator))
    }

    async fn resolve_access_url(
        &self,
        locator: &Locator,
        _download_name: &str,
    ) -> Result<Option<String>, ApplicationError> {
        Ok(self
            .inner
            .public_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base, locator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content: &'static [u8], size_hint: Option<u64>) -> BlobUpload<'static> {
        BlobUpload {
            owner_id: 7,
            original_name: "notes.txt".into(),
            mime_type: "text/plain".into(),
            size_hint,
            content: stream::iter(vec![Ok(Bytes::from_static(content))]).boxed(),
        }
    }

    async fn read_all(mut content: ByteStream<'static>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = content.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn put_then_get_returns_same_bytes() {
        let store = InMemoryBlobStore::new(1024);
        let stored = store.put(upload(b"hello", Some(5))).await.unwrap();

        assert_eq!(stored.size, 5);
        assert!(stored.locator.as_str().starts_with("user_7/"));
        let content = store.get(&stored.locator).await.unwrap();
        assert_eq!(read_all(content).await, b"hello");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = InMemoryBlobStore::new(1024);
        let stored = store.put(upload(b"hello", None)).await.unwrap();

        assert!(store.delete(&stored.locator).await.unwrap());
        assert!(!store.delete(&stored.locator).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn oversized_hint_is_rejected_without_attempt() {
        let store = InMemoryBlobStore::new(4);
        let err = store.put(upload(b"hello", Some(5))).await.unwrap_err();

        assert_eq!(err.code(), "TooLarge");
        assert_eq!(store.put_attempts(), 0);
    }

    #[tokio::test]
    async fn public_base_url_yields_direct_links() {
        let store = InMemoryBlobStore::with_public_base_url(1024, "https://cdn.example.com/");
        let stored = store.put(upload(b"hello", None)).await.unwrap();

        let url = store
            .resolve_access_url(&stored.locator, "notes.txt")
            .await
            .unwrap();
        assert_eq!(
            url,
            Some(format!("https://cdn.example.com/{}", stored.locator))
        );
        assert_eq!(store.provider(), Provider::RemoteObject);
    }
}
