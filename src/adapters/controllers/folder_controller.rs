use axum::{
    extract::{rejection::FormRejection, Path, State},
    Form, Json,
};
use tracing::warn;

use crate::{
    adapters::{
        controllers::parse_id,
        dto::folder_dto::{CreateFolderRequest, FolderListResponse},
        error::Flash,
        middleware::AuthenticatedSubject,
    },
    application::{
        error::ApplicationError,
        services::{DeletionService, FolderService},
    },
};

pub const FOLDER_LISTING_PATH: &str = "/folders";
pub const NEW_FOLDER_PATH: &str = "/folders/new";

pub struct FolderController;

impl FolderController {
    /// GET /folders
    pub async fn list_folders(
        State(folders): State<FolderService>,
        AuthenticatedSubject(subject): AuthenticatedSubject,
    ) -> Result<Json<FolderListResponse>, ApplicationError> {
        let summaries = folders.list_folders(&subject).await?;
        Ok(Json(FolderListResponse::from(summaries)))
    }

    /// POST /folders
    pub async fn create_folder(
        State(folders): State<FolderService>,
        AuthenticatedSubject(subject): AuthenticatedSubject,
        form: Result<Form<CreateFolderRequest>, FormRejection>,
    ) -> Flash {
        let request = match form {
            Ok(Form(request)) => request,
            Err(e) => {
                warn!("Invalid folder form: {}", e);
                return Flash::error(
                    NEW_FOLDER_PATH,
                    &ApplicationError::BadRequest("Invalid request format".to_string()),
                );
            }
        };

        let name = request.name.unwrap_or_default();
        match folders.create_folder(&subject, &name).await {
            Ok(_) => Flash::success(FOLDER_LISTING_PATH, "FolderCreated"),
            Err(e) => Flash::error(NEW_FOLDER_PATH, &e),
        }
    }

    /// POST /folders/{folder_id}/delete
    pub async fn delete_folder(
        State(deletions): State<DeletionService>,
        AuthenticatedSubject(subject): AuthenticatedSubject,
        Path(folder_id): Path<String>,
    ) -> Flash {
        let deletion = async {
            let folder_id = parse_id(&folder_id, "folder")?;
            deletions.delete_folder(&subject, folder_id).await
        };

        match deletion.await {
            Ok(report) if report.blob_failures().next().is_some() => {
                Flash::success(FOLDER_LISTING_PATH, "FolderDeletedWithWarnings")
            }
            Ok(_) => Flash::success(FOLDER_LISTING_PATH, "FolderDeleted"),
            Err(e) => Flash::error(FOLDER_LISTING_PATH, &e),
        }
    }
}
