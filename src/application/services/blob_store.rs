use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::{
    application::error::ApplicationError,
    domain::{
        config::storage::Provider,
        models::file::{Locator, StoredBlob},
    },
};

pub type ByteStream<'a> = BoxStream<'a, std::io::Result<Bytes>>;

/// One incoming blob. `size_hint` is whatever the client declared; the
/// store still counts the bytes it actually receives.
pub struct BlobUpload<'a> {
    pub owner_id: i64,
    pub original_name: String,
    pub mime_type: String,
    pub size_hint: Option<u64>,
    pub content: ByteStream<'a>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    fn provider(&self) -> Provider;

    /// Consumes the stream and commits it. Fails with `TooLarge` before
    /// reading when the hint is over the ceiling, or as soon as the running
    /// total crosses it. Nothing is left behind on failure.
    async fn put(&self, upload: BlobUpload<'_>) -> Result<StoredBlob, ApplicationError>;

    async fn get(&self, locator: &Locator) -> Result<ByteStream<'static>, ApplicationError>;

    /// Idempotent. `Ok(false)` means there was nothing to delete.
    async fn delete(&self, locator: &Locator) -> Result<bool, ApplicationError>;

    /// A URL the client can fetch directly, or `None` when the bytes have to
    /// be streamed through this service.
    async fn resolve_access_url(
        &self,
        locator: &Locator,
        download_name: &str,
    ) -> Result<Option<String>, ApplicationError>;
}
