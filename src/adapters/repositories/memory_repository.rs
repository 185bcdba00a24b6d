//! Metadata store kept in process memory. Used by tests and by the HTTP
//! test harness in place of Postgres.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    application::{
        dto::{
            file_dto::{FileQueryDTO, NewFileDTO},
            folder_dto::NewFolderDTO,
        },
        error::{ApplicationError, PersistenceErrorKind},
        repositories::{file_repository::FileRepository, folder_repository::FolderRepository},
    },
    domain::models::{
        file::{File, Locator},
        folder::{Folder, FolderSummary},
    },
};

#[derive(Default)]
struct Tables {
    next_folder_id: i64,
    next_file_id: i64,
    folders: BTreeMap<i64, Folder>,
    files: BTreeMap<i64, File>,
}

#[derive(Clone, Default)]
pub struct InMemoryMetadataStore {
    tables: Arc<Mutex<Tables>>,
    fail_file_inserts: Arc<AtomicBool>,
    folder_lookups: Arc<AtomicUsize>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, ApplicationError> {
        self.tables.lock().map_err(|_| {
            ApplicationError::persistence(PersistenceErrorKind::WriteFailed, "store lock poisoned")
        })
    }

    /// Inserts a folder with a fixed id.
    pub fn seed_folder(&self, folder: Folder) {
        if let Ok(mut tables) = self.tables() {
            tables.next_folder_id = tables.next_folder_id.max(folder.id);
            tables.folders.insert(folder.id, folder);
        }
    }

    /// Makes every following file insert fail like a broken connection.
    pub fn fail_file_inserts(&self, fail: bool) {
        self.fail_file_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn folder_lookups(&self) -> usize {
        self.folder_lookups.load(Ordering::SeqCst)
    }

    pub fn file_count(&self) -> usize {
        self.tables().map(|t| t.files.len()).unwrap_or_default()
    }

    pub fn folder_count(&self) -> usize {
        self.tables().map(|t| t.folders.len()).unwrap_or_default()
    }

    pub fn file_locator(&self, file_id: i64) -> Option<Locator> {
        self.tables()
            .ok()?
            .files
            .get(&file_id)
            .map(|f| f.locator.clone())
    }
}

/// Newest first; ids break ties between rows created in the same instant.
fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<Utc>, i64)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl FolderRepository for InMemoryMetadataStore {
    async fn create_folder(&self, folder: NewFolderDTO) -> Result<Folder, ApplicationError> {
        let mut tables = self.tables()?;
        tables.next_folder_id += 1;
        let created = Folder {
            id: tables.next_folder_id,
            name: folder.name,
            owner_id: folder.owner_id,
            created_at: Utc::now(),
        };
        tables.folders.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_folder(&self, folder_id: i64) -> Result<Option<Folder>, ApplicationError> {
        self.folder_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables()?.folders.get(&folder_id).cloned())
    }

    async fn list_folders(&self, owner_id: i64) -> Result<Vec<FolderSummary>, ApplicationError> {
        let tables = self.tables()?;
        let mut summaries: Vec<FolderSummary> = tables
            .folders
            .values()
            .filter(|f| f.owner_id == owner_id)
            .map(|folder| FolderSummary {
                file_count: tables
                    .files
                    .values()
                    .filter(|file| file.folder_id == Some(folder.id))
                    .count() as u64,
                folder: folder.clone(),
            })
            .collect();
        newest_first(&mut summaries, |s| (s.folder.created_at, s.folder.id));
        Ok(summaries)
    }

    async fn delete_folder_cascade(&self, folder_id: i64) -> Result<u64, ApplicationError> {
        let mut tables = self.tables()?;
        let before = tables.files.len();
        tables.files.retain(|_, file| file.folder_id != Some(folder_id));
        let removed = (before - tables.files.len()) as u64;
        tables.folders.remove(&folder_id);
        Ok(removed)
    }
}

#[async_trait]
impl FileRepository for InMemoryMetadataStore {
    async fn create_file(&self, file: NewFileDTO) -> Result<File, ApplicationError> {
        if self.fail_file_inserts.load(Ordering::SeqCst) {
            return Err(ApplicationError::persistence(
                PersistenceErrorKind::WriteFailed,
                "injected insert failure",
            ));
        }

        let mut file = file;
        file.sanitize();

        let mut tables = self.tables()?;
        if let Some(folder_id) = file.folder_id {
            let same_owner = tables
                .folders
                .get(&folder_id)
                .is_some_and(|folder| folder.owner_id == file.owner_id);
            if !same_owner {
                return Err(ApplicationError::persistence(
                    PersistenceErrorKind::WriteFailed,
                    format!("folder {folder_id} does not belong to owner {}", file.owner_id),
                ));
            }
        }

        tables.next_file_id += 1;
        let created = File {
            id: tables.next_file_id,
            filename: file.filename,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size: file.size,
            locator: file.locator,
            owner_id: file.owner_id,
            folder_id: file.folder_id,
            created_at: Utc::now(),
        };
        tables.files.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_file(&self, file_id: i64) -> Result<Option<File>, ApplicationError> {
        Ok(self.tables()?.files.get(&file_id).cloned())
    }

    async fn list_files(&self, query: FileQueryDTO) -> Result<Vec<File>, ApplicationError> {
        let tables = self.tables()?;
        let mut files: Vec<File> = tables
            .files
            .values()
            .filter(|f| f.owner_id == query.owner_id)
            .filter(|f| query.folder_id.is_none() || f.folder_id == query.folder_id)
            .cloned()
            .collect();
        newest_first(&mut files, |f| (f.created_at, f.id));
        files.truncate(query.effective_limit() as usize);
        Ok(files)
    }

    async fn list_files_in_folder(&self, folder_id: i64) -> Result<Vec<File>, ApplicationError> {
        let tables = self.tables()?;
        Ok(tables
            .files
            .values()
            .filter(|f| f.folder_id == Some(folder_id))
            .cloned()
            .collect())
    }
}
