use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::debug;

use crate::{adapters::state::AppState, domain::config::upload::UploadPolicy};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub config: HealthConfigInfo,
    pub metrics: HostMetrics,
}

/// Upload policy as clients see it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthConfigInfo {
    pub max_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl From<&UploadPolicy> for HealthConfigInfo {
    fn from(policy: &UploadPolicy) -> Self {
        Self {
            max_bytes: policy.max_bytes,
            allowed_mime_types: policy.allowed_mime.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostMetrics {
    pub cpu_usage_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub memory_usage_percent: f32,
}

impl HostMetrics {
    fn sample() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let used = sys.used_memory();
        let total = sys.total_memory();
        Self {
            cpu_usage_percent: sys.global_cpu_usage(),
            memory_used_bytes: used,
            memory_total_bytes: total,
            memory_usage_percent: match total {
                0 => 0.0,
                total => used as f32 / total as f32 * 100.0,
            },
        }
    }
}

pub struct HealthController;

impl HealthController {
    /// GET /health
    pub async fn health_check(State(app_state): State<AppState>) -> Json<HealthResponse> {
        let provider = app_state.blob_store.provider();
        debug!("Health check, blob backend {}", provider.as_str());

        Json(HealthResponse {
            status: "healthy".to_string(),
            provider: provider.as_str().to_string(),
            config: HealthConfigInfo::from(&app_state.upload_policy),
            metrics: HostMetrics::sample(),
        })
    }
}
