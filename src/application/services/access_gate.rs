use tracing::warn;

use crate::{
    application::error::ApplicationError,
    domain::models::subject::{Owned, Subject},
};

/// Ownership scoping shared by every operation that touches a folder or file.
pub struct AccessGate;

impl AccessGate {
    pub fn authorize<R: Owned + ?Sized>(subject: &Subject, resource: &R) -> bool {
        resource.owner_id() == subject.id
    }

    /// Mutations: a foreign resource is a permission error.
    pub fn require_owner<R: Owned + ?Sized>(
        subject: &Subject,
        resource: &R,
    ) -> Result<(), ApplicationError> {
        if Self::authorize(subject, resource) {
            Ok(())
        } else {
            warn!(
                "Subject {} denied access to resource owned by {}",
                subject.id,
                resource.owner_id()
            );
            Err(ApplicationError::Permission)
        }
    }

    /// Reads: missing and foreign resources look the same.
    pub fn visible<R: Owned>(subject: &Subject, resource: Option<R>) -> Result<R, ApplicationError> {
        match resource {
            Some(r) if Self::authorize(subject, &r) => Ok(r),
            Some(r) => {
                warn!(
                    "Subject {} asked for resource owned by {}",
                    subject.id,
                    r.owner_id()
                );
                Err(ApplicationError::NotFound)
            }
            None => Err(ApplicationError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::models::folder::Folder;

    fn folder(owner_id: i64) -> Folder {
        Folder {
            id: 3,
            name: "docs".into(),
            owner_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn owner_is_authorized() {
        assert!(AccessGate::authorize(&Subject::new(7), &folder(7)));
        assert!(!AccessGate::authorize(&Subject::new(8), &folder(7)));
    }

    #[test]
    fn foreign_resource_is_permission_error_for_mutation() {
        let err = AccessGate::require_owner(&Subject::new(8), &folder(7)).unwrap_err();
        assert!(matches!(err, ApplicationError::Permission));
    }

    #[test]
    fn foreign_resource_is_hidden_for_reads() {
        let err = AccessGate::visible(&Subject::new(8), Some(folder(7))).unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound));

        let err = AccessGate::visible::<Folder>(&Subject::new(7), None).unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound));

        let found = AccessGate::visible(&Subject::new(7), Some(folder(7))).unwrap();
        assert_eq!(found.id, 3);
    }
}
