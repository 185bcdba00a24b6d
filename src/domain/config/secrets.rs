use serde::{Deserialize, Serialize};

/// Credentials for an S3-compatible object store.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct S3Secrets {
    #[serde(rename = "endpoint")]
    pub endpoint: String,
    #[serde(rename = "region")]
    pub region: String,
    #[serde(rename = "accessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "secretAccessKey")]
    pub secret_access_key: String,
    #[serde(rename = "bucketName")]
    pub bucket_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Secrets {
    #[serde(rename = "databaseUrl")]
    pub database_url: String,
    #[serde(rename = "sessionSecret")]
    pub session_secret: String,
    #[serde(rename = "s3Secrets")]
    pub s3_secrets: Option<S3Secrets>,
}
