use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_BYTES: u64 = 20 * 1024 * 1024;

pub const DEFAULT_ALLOWED_MIME: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "application/pdf",
    "text/plain",
];

/// Size ceiling and MIME allow-list applied to every upload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UploadPolicy {
    #[serde(rename = "maxBytes")]
    pub max_bytes: u64,
    #[serde(rename = "allowedMime")]
    pub allowed_mime: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            allowed_mime: DEFAULT_ALLOWED_MIME.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl UploadPolicy {
    pub fn new(max_bytes: u64, allowed_mime: Vec<String>) -> Self {
        Self {
            max_bytes,
            allowed_mime: allowed_mime.iter().map(|m| normalize_mime(m)).collect(),
        }
    }

    pub fn allows_mime(&self, mime_type: &str) -> bool {
        let wanted = normalize_mime(mime_type);
        self.allowed_mime.iter().any(|m| *m == wanted)
    }

    pub fn exceeds(&self, size: u64) -> bool {
        size > self.max_bytes
    }
}

/// `Text/Plain; charset=utf-8` -> `text/plain`
pub fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_stock_limits() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.max_bytes, 20 * 1024 * 1024);
        assert!(policy.allows_mime("application/pdf"));
        assert!(!policy.allows_mime("application/zip"));
    }

    #[test]
    fn mime_check_ignores_case_and_parameters() {
        let policy = UploadPolicy::default();
        assert!(policy.allows_mime("Text/Plain; charset=utf-8"));
        assert!(policy.allows_mime(" image/PNG "));
        assert!(!policy.allows_mime(""));
    }

    #[test]
    fn size_limit_is_inclusive() {
        let policy = UploadPolicy::new(10, vec!["text/plain".into()]);
        assert!(!policy.exceeds(10));
        assert!(policy.exceeds(11));
    }
}
