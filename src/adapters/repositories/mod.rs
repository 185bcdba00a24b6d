mod memory_repository;
mod pg_file_repository;
mod pg_folder_repository;
mod schema;

pub use memory_repository::InMemoryMetadataStore;
pub use pg_file_repository::PgFileRepository;
pub use pg_folder_repository::PgFolderRepository;
pub use schema::ensure_schema;

use crate::application::error::{ApplicationError, PersistenceErrorKind};

pub(crate) fn db_error(error: sqlx::Error) -> ApplicationError {
    match error {
        sqlx::Error::PoolTimedOut => {
            ApplicationError::persistence(PersistenceErrorKind::Timeout, "connection pool timed out")
        }
        other => ApplicationError::persistence(PersistenceErrorKind::WriteFailed, other.to_string()),
    }
}
