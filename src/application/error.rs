use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    TooLarge,
    InvalidType,
    MissingField(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobStoreErrorKind {
    WriteFailed,
    Timeout,
    NotFound,
    /// Reads, deletes and credential problems.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceErrorKind {
    WriteFailed,
    Timeout,
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("validation failed: {0:?}")]
    Validation(ValidationReason),

    #[error("subject does not own the resource")]
    Permission,

    #[error("resource not found")]
    NotFound,

    #[error("blob store {kind:?}: {detail}")]
    BlobStore {
        kind: BlobStoreErrorKind,
        detail: String,
    },

    #[error("metadata store {kind:?}: {detail}")]
    Persistence {
        kind: PersistenceErrorKind,
        detail: String,
    },

    #[error("no authenticated subject")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApplicationError {
    pub fn blob(kind: BlobStoreErrorKind, detail: impl Into<String>) -> Self {
        ApplicationError::BlobStore {
            kind,
            detail: detail.into(),
        }
    }

    pub fn persistence(kind: PersistenceErrorKind, detail: impl Into<String>) -> Self {
        ApplicationError::Persistence {
            kind,
            detail: detail.into(),
        }
    }

    /// Stable indicator handed back to the client in redirects.
    pub fn code(&self) -> &'static str {
        match self {
            ApplicationError::Validation(ValidationReason::TooLarge) => "TooLarge",
            ApplicationError::Validation(ValidationReason::InvalidType) => "InvalidType",
            ApplicationError::Validation(ValidationReason::MissingField(_)) => "MissingField",
            ApplicationError::Permission => "PermissionError",
            ApplicationError::NotFound => "NotFound",
            ApplicationError::BlobStore { .. } => "BlobStoreError",
            ApplicationError::Persistence { .. } => "PersistenceError",
            ApplicationError::Unauthorized => "Unauthorized",
            ApplicationError::BadRequest(_) => "BadRequest",
        }
    }

    /// Infrastructure faults, as opposed to client mistakes.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ApplicationError::BlobStore { .. } | ApplicationError::Persistence { .. }
        )
    }
}
