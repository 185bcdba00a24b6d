pub mod secrets;
pub mod storage;
pub mod upload;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use secrets::{S3Secrets, Secrets};
use storage::{Provider, StorageConfig, Timeouts};
use upload::{UploadPolicy, DEFAULT_ALLOWED_MIME, DEFAULT_MAX_BYTES};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub db_max_connections: u32,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub upload: UploadPolicy,
    pub storage: StorageConfig,
    pub secrets: Secrets,
    pub timeouts: Timeouts,
    pub delete_concurrency: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any key lookup, so callers other than
    /// the process environment (tests, mostly) can feed it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = parse_or(&get, "PORT", 8080u16)?;
        let db_max_connections = parse_or(&get, "DB_MAX_CONNECTIONS", 5u32)?;

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        });

        let max_bytes = parse_or(&get, "MAX_BYTES", DEFAULT_MAX_BYTES)?;
        if max_bytes == 0 {
            return Err(invalid("MAX_BYTES", "0"));
        }
        let allowed_mime = match get("ALLOWED_MIME") {
            Some(raw) => {
                let list = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>();
                if list.is_empty() {
                    return Err(invalid("ALLOWED_MIME", &raw));
                }
                list
            }
            None => DEFAULT_ALLOWED_MIME.iter().map(|m| m.to_string()).collect(),
        };
        let upload = UploadPolicy::new(max_bytes, allowed_mime);

        let defaults = StorageConfig::default();
        let provider = match get("STORAGE_PROVIDER") {
            Some(raw) => Provider::parse(&raw).ok_or_else(|| invalid("STORAGE_PROVIDER", &raw))?,
            None => defaults.provider,
        };
        let storage = StorageConfig {
            provider,
            local_root: get("LOCAL_STORAGE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_root),
            key_prefix: get("S3_KEY_PREFIX")
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or(defaults.key_prefix),
            public_base_url: get("S3_PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            presign_ttl: Duration::from_secs(parse_or(
                &get,
                "PRESIGN_TTL_SECS",
                defaults.presign_ttl.as_secs(),
            )?),
        };

        let s3_secrets = if provider == Provider::RemoteObject {
            Some(S3Secrets {
                endpoint: required("S3_ENDPOINT")?,
                region: get("S3_REGION").unwrap_or_else(|| "auto".to_string()),
                access_key_id: required("S3_ACCESS_KEY_ID")?,
                secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
                bucket_name: required("S3_BUCKET")?,
            })
        } else {
            None
        };

        let secrets = Secrets {
            database_url: required("DATABASE_URL")?,
            session_secret: required("SESSION_SECRET")?,
            s3_secrets,
        };

        let default_timeouts = Timeouts::default();
        let timeouts = Timeouts {
            blob: Duration::from_secs(parse_or(
                &get,
                "BLOB_TIMEOUT_SECS",
                default_timeouts.blob.as_secs(),
            )?),
            metadata: Duration::from_secs(parse_or(
                &get,
                "METADATA_TIMEOUT_SECS",
                default_timeouts.metadata.as_secs(),
            )?),
        };

        let delete_concurrency = parse_or(&get, "DELETE_CONCURRENCY", 8usize)?;
        if delete_concurrency == 0 {
            return Err(invalid("DELETE_CONCURRENCY", "0"));
        }

        Ok(Self {
            port,
            db_max_connections,
            cors_allowed_origins,
            upload,
            storage,
            secrets,
            timeouts,
            delete_concurrency,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| invalid(name, &raw)),
        None => Ok(default),
    }
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}
