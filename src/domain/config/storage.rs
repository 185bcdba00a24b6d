use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    #[serde(rename = "local")]
    LocalDisk,
    #[serde(rename = "s3")]
    RemoteObject,
}

impl Provider {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "disk" | "localdisk" => Some(Provider::LocalDisk),
            "s3" | "remote" | "remoteobject" => Some(Provider::RemoteObject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::LocalDisk => "local",
            Provider::RemoteObject => "s3",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub provider: Provider,
    pub local_root: PathBuf,
    pub key_prefix: String,
    pub public_base_url: Option<String>,
    pub presign_ttl: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: Provider::LocalDisk,
            local_root: PathBuf::from("./uploads"),
            key_prefix: "file_uploader".to_string(),
            public_base_url: None,
            presign_ttl: Duration::from_secs(900),
        }
    }
}

/// Per-operation deadlines for the two stores.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub blob: Duration,
    pub metadata: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            blob: Duration::from_secs(120),
            metadata: Duration::from_secs(10),
        }
    }
}
