#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{header::LOCATION, HeaderValue};
use axum_test::{TestResponse, TestServer};
use chrono::{Duration, Utc};
use file_uploader::{
    adapters::{
        middleware::SessionKeys, repositories::InMemoryMetadataStore, router::build_router,
        state::AppState,
    },
    domain::{
        config::{storage::Timeouts, upload::UploadPolicy},
        models::{folder::Folder, subject::Subject},
    },
    services::InMemoryBlobStore,
};

pub const SESSION_SECRET: &str = "test-secret-key-for-testing-only";
pub const MIB: u64 = 1024 * 1024;

pub struct TestApp {
    pub server: TestServer,
    pub blobs: InMemoryBlobStore,
    pub metadata: InMemoryMetadataStore,
    keys: SessionKeys,
}

impl TestApp {
    pub fn new(max_bytes: u64) -> Self {
        Self::with_blobs(InMemoryBlobStore::new(max_bytes), max_bytes)
    }

    /// Blob store that hands out direct URLs, like a public bucket.
    pub fn with_direct_urls(max_bytes: u64) -> Self {
        Self::with_blobs(
            InMemoryBlobStore::with_public_base_url(max_bytes, "https://cdn.example.com"),
            max_bytes,
        )
    }

    fn with_blobs(blobs: InMemoryBlobStore, max_bytes: u64) -> Self {
        let metadata = InMemoryMetadataStore::new();
        let keys = SessionKeys::new(SESSION_SECRET);
        let policy = UploadPolicy::new(
            max_bytes,
            vec![
                "image/png".into(),
                "application/pdf".into(),
                "text/plain".into(),
            ],
        );

        let state = AppState::new(
            policy,
            keys.clone(),
            Arc::new(blobs.clone()),
            Arc::new(metadata.clone()),
            Arc::new(metadata.clone()),
            Timeouts::default(),
            4,
        );

        let server = TestServer::new(build_router(state)).expect("Failed to create test server");

        Self {
            server,
            blobs,
            metadata,
            keys,
        }
    }

    pub fn bearer(&self, subject_id: i64) -> String {
        let token = self
            .keys
            .issue(&Subject::new(subject_id), Duration::minutes(10))
            .expect("Failed to sign token");
        format!("Bearer {token}")
    }

    pub fn seed_folder(&self, id: i64, owner_id: i64, name: &str) {
        self.metadata.seed_folder(Folder {
            id,
            name: name.to_string(),
            owner_id,
            created_at: Utc::now(),
        });
    }
}

pub fn location(response: &TestResponse) -> HeaderValue {
    response.header(LOCATION)
}
