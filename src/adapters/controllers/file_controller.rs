use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use tracing::info;

use crate::{
    adapters::{
        controllers::parse_id,
        dto::file_dto::{FileListResponse, FileResponse, ListFilesQuery},
        error::Flash,
        middleware::AuthenticatedSubject,
    },
    application::{
        error::ApplicationError,
        services::{Download, FileService},
    },
    domain::models::file::attachment_disposition,
};

pub const FILE_LISTING_PATH: &str = "/files";

pub struct FileController;

impl FileController {
    /// GET /files?folderId=<id>
    pub async fn list_files(
        State(files): State<FileService>,
        AuthenticatedSubject(subject): AuthenticatedSubject,
        Query(query): Query<ListFilesQuery>,
    ) -> Result<Json<FileListResponse>, ApplicationError> {
        let folder_id = match query.folder_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_id(raw, "folder")?),
            _ => None,
        };

        let listed = files.list_files(&subject, folder_id).await?;
        Ok(Json(FileListResponse::new(folder_id, listed)))
    }

    /// GET /files/{file_id}
    pub async fn get_file(
        State(files): State<FileService>,
        AuthenticatedSubject(subject): AuthenticatedSubject,
        Path(file_id): Path<String>,
    ) -> Result<Json<FileResponse>, Flash> {
        let lookup = async {
            let file_id = parse_id(&file_id, "file")?;
            files.get_file(&subject, file_id).await
        };

        lookup
            .await
            .map(|file| Json(FileResponse::from(file)))
            .map_err(|e| Flash::error(FILE_LISTING_PATH, &e))
    }

    /// GET /files/{file_id}/download
    ///
    /// Redirects to the backend when it can serve the bytes itself, otherwise
    /// streams them as an attachment named after the original upload.
    pub async fn download_file(
        State(files): State<FileService>,
        AuthenticatedSubject(subject): AuthenticatedSubject,
        Path(file_id): Path<String>,
    ) -> Result<Response, Flash> {
        let download = async {
            let file_id = parse_id(&file_id, "file")?;
            files.open_download(&subject, file_id).await
        };

        match download.await {
            Ok(Download::Redirect(url)) => Ok(Redirect::to(&url).into_response()),
            Ok(Download::Stream { file, content }) => {
                info!("Streaming file {} to subject {}", file.id, subject.id);
                Ok((
                    [
                        (header::CONTENT_TYPE, file.mime_type.clone()),
                        (
                            header::CONTENT_DISPOSITION,
                            attachment_disposition(&file.original_name),
                        ),
                    ],
                    Body::from_stream(content),
                )
                    .into_response())
            }
            Err(e) => Err(Flash::error(FILE_LISTING_PATH, &e)),
        }
    }
}
