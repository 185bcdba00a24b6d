use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials, Region},
    error::{DisplayErrorContext, SdkError},
    presigning::PresigningConfig,
    primitives::ByteStream as S3ByteStream,
    types::{CompletedMultipartUpload, CompletedPart},
    Client,
};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::{
    application::{
        error::ApplicationError,
        services::{BlobStore, BlobUpload, ByteStream},
    },
    domain::{
        config::{
            secrets::S3Secrets,
            storage::{Provider, StorageConfig},
        },
        models::file::{attachment_disposition, Locator, StoredBlob},
    },
    services::{
        blob_key,
        error::{SizeGuard, StorageError},
    },
};

/// Buffered bytes are flushed as a multipart part once they reach this size.
/// S3 requires every part but the last to be at least 5 MiB.
const PART_SIZE: usize = 8 * 1024 * 1024;

/// S3-compatible object storage (AWS, R2, MinIO, Supabase storage).
pub struct S3StorageService {
    client: Client,
    bucket: String,
    key_prefix: String,
    public_base_url: Option<String>,
    presign_ttl: Duration,
    max_bytes: u64,
}

impl S3StorageService {
    pub fn new(
        secrets: S3Secrets,
        storage: &StorageConfig,
        max_bytes: u64,
    ) -> Result<Self, StorageError> {
        if secrets.bucket_name.trim().is_empty() {
            return Err(StorageError::InvalidCredentials(
                "bucket name is empty".to_string(),
            ));
        }

        let credentials = Credentials::new(
            secrets.access_key_id,
            secrets.secret_access_key,
            None,
            None,
            "file-uploader",
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(secrets.endpoint.trim_end_matches('/'))
            .region(Region::new(secrets.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(config),
            bucket: secrets.bucket_name,
            key_prefix: storage.key_prefix.clone(),
            public_base_url: storage.public_base_url.clone(),
            presign_ttl: storage.presign_ttl,
            max_bytes,
        })
    }

    fn object_key(&self, owner_id: i64, original_name: &str) -> String {
        let key = blob_key(owner_id, original_name);
        if self.key_prefix.is_empty() {
            key
        } else {
            format!("{}/{}", self.key_prefix, key)
        }
    }

    async fn start_multipart(
        &self,
        key: &str,
        mime_type: &str,
    ) -> Result<MultipartUpload, StorageError> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .content_type(mime_type)
            .send()
            .await
            .map_err(|e| sdk_failure("create multipart upload", e))?;

        let upload_id = output.upload_id().ok_or_else(|| {
            StorageError::ProviderError("multipart upload without an id".to_string())
        })?;

        Ok(MultipartUpload {
            client: self.client.clone(),
            bucket: self.bucket.clone(),
            key: key.to_string(),
            upload_id: upload_id.to_string(),
            parts: Vec::new(),
            finished: false,
        })
    }

    async fn put_single(&self, key: &str, mime_type: &str, body: Bytes) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(mime_type)
            .content_length(body.len() as i64)
            .body(S3ByteStream::from(body))
            .send()
            .await
            .map_err(|e| sdk_failure("put object", e))?;
        Ok(())
    }
}

/// In-flight multipart upload. Aborted on drop unless completed, which also
/// covers the request being cancelled mid-stream.
struct MultipartUpload {
    client: Client,
    bucket: String,
    key: String,
    upload_id: String,
    parts: Vec<CompletedPart>,
    finished: bool,
}

impl MultipartUpload {
    async fn upload_part(&mut self, body: Bytes) -> Result<(), StorageError> {
        let part_number = self.parts.len() as i32 + 1;

        let output = self
            .client
            .upload_part()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .part_number(part_number)
            .body(S3ByteStream::from(body))
            .send()
            .await
            .map_err(|e| sdk_failure("upload part", e))?;

        self.parts.push(
            CompletedPart::builder()
                .set_e_tag(output.e_tag().map(str::to_string))
                .part_number(part_number)
                .build(),
        );
        Ok(())
    }

    async fn complete(mut self) -> Result<(), StorageError> {
        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(std::mem::take(&mut self.parts)))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(&self.key)
            .upload_id(&self.upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(|e| sdk_failure("complete multipart upload", e))?;

        self.finished = true;
        Ok(())
    }
}

impl Drop for MultipartUpload {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime to abort multipart upload {}", self.upload_id);
            return;
        };

        let client = self.client.clone();
        let bucket = self.bucket.clone();
        let key = self.key.clone();
        let upload_id = self.upload_id.clone();
        runtime.spawn(async move {
            let aborted = client
                .abort_multipart_upload()
                .bucket(&bucket)
                .key(&key)
                .upload_id(&upload_id)
                .send()
                .await;
            if let Err(e) = aborted {
                warn!(
                    "Failed to abort multipart upload {} for {}: {}",
                    upload_id,
                    key,
                    DisplayErrorContext(&e)
                );
            }
        });
    }
}

fn sdk_failure<E, R>(operation: &str, error: SdkError<E, R>) -> StorageError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &error {
        SdkError::TimeoutError(_) => StorageError::Timeout(format!("{operation} timed out")),
        SdkError::DispatchFailure(_) => {
            StorageError::NetworkError(format!("{operation}: {}", DisplayErrorContext(&error)))
        }
        _ => StorageError::ProviderError(format!("{operation}: {}", DisplayErrorContext(&error))),
    }
}

#[async_trait]
impl BlobStore for S3StorageService {
    fn provider(&self) -> Provider {
        Provider::RemoteObject
    }

    async fn put(&self, upload: BlobUpload<'_>) -> Result<StoredBlob, ApplicationError> {
        let mut guard = SizeGuard::new(self.max_bytes, upload.size_hint)?;
        let key = self.object_key(upload.owner_id, &upload.original_name);

        let mut content = upload.content;
        let mut buffer = BytesMut::new();
        let mut multipart: Option<MultipartUpload> = None;

        while let Some(chunk) = content.next().await {
            let chunk = chunk.map_err(|e| {
                StorageError::WriteFailed(format!("upload stream aborted: {e}"))
            })?;
            guard.add(chunk.len())?;
            buffer.extend_from_slice(&chunk);

            if buffer.len() >= PART_SIZE {
                let part = buffer.split().freeze();
                match multipart.as_mut() {
                    Some(upload) => upload.upload_part(part).await?,
                    None => {
                        let mut upload = self.start_multipart(&key, &upload.mime_type).await?;
                        upload.upload_part(part).await?;
                        multipart = Some(upload);
                    }
                }
            }
        }

        match multipart {
            Some(mut upload) => {
                if !buffer.is_empty() {
                    upload.upload_part(buffer.freeze()).await?;
                }
                upload.complete().await?;
            }
            None => {
                self.put_single(&key, &upload.mime_type, buffer.freeze())
                    .await?;
            }
        }

        debug!("Stored {} bytes at s3://{}/{}", guard.total(), self.bucket, key);

        Ok(StoredBlob {
            locator: Locator::new(key),
            size: guard.total(),
        })
    }

    async fn get(&self, locator: &Locator) -> Result<ByteStream<'static>, ApplicationError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(locator.as_str())
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                let missing = e.as_service_error().is_some_and(|se| se.is_no_such_key());
                return Err(if missing {
                    StorageError::NotFound(locator.to_string())
                } else {
                    sdk_failure("get object", e)
                }
                .into());
            }
        };

        Ok(ReaderStream::new(output.body.into_async_read()).boxed())
    }

    async fn delete(&self, locator: &Locator) -> Result<bool, ApplicationError> {
        // DeleteObject succeeds for absent keys, so ask first to report what happened.
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(locator.as_str())
            .send()
            .await;
        if let Err(e) = head {
            let missing = e.as_service_error().is_some_and(|se| se.is_not_found());
            if missing {
                return Ok(false);
            }
            return Err(sdk_failure("head object", e).into());
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(locator.as_str())
            .send()
            .await
            .map_err(|e| sdk_failure("delete object", e))?;

        Ok(true)
    }

    async fn resolve_access_url(
        &self,
        locator: &Locator,
        download_name: &str,
    ) -> Result<Option<String>, ApplicationError> {
        if let Some(base) = &self.public_base_url {
            return Ok(Some(format!("{}/{}", base, locator)));
        }

        let presigning = PresigningConfig::expires_in(self.presign_ttl)
            .map_err(|e| StorageError::ProviderError(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(locator.as_str())
            .response_content_disposition(attachment_disposition(download_name))
            .presigned(presigning)
            .await
            .map_err(|e| sdk_failure("presign get object", e))?;

        Ok(Some(request.uri().to_string()))
    }
}
