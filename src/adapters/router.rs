use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::adapters::{
    controllers::{
        file_controller::FileController, folder_controller::FolderController,
        health_controller::HealthController, upload_controller::UploadController,
    },
    state::AppState,
};

/// Room for multipart boundaries and the small text fields next to the file.
pub const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(app_state: AppState) -> Router {
    let upload_limit = usize::try_from(app_state.upload_policy.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(HealthController::health_check))
        .route(
            "/upload",
            post(UploadController::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files", get(FileController::list_files))
        .route("/files/{file_id}", get(FileController::get_file))
        .route(
            "/files/{file_id}/download",
            get(FileController::download_file),
        )
        .route(
            "/folders",
            get(FolderController::list_folders).post(FolderController::create_folder),
        )
        .route(
            "/folders/{folder_id}/delete",
            post(FolderController::delete_folder),
        )
        .with_state(app_state)
}
