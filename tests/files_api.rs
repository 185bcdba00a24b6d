mod common;

use axum::http::{
    header::{AUTHORIZATION, CONTENT_DISPOSITION},
    StatusCode,
};
use axum_test::multipart::{MultipartForm, Part};
use common::{location, TestApp, MIB};
use file_uploader::adapters::dto::file_dto::{FileListResponse, FileResponse};

async fn upload(app: &TestApp, subject_id: i64, name: &str, body: &[u8]) -> FileResponse {
    let part = Part::bytes(body.to_vec())
        .file_name(name.to_string())
        .mime_type("text/plain");
    app.server
        .post("/upload")
        .add_header(AUTHORIZATION, app.bearer(subject_id))
        .multipart(MultipartForm::new().add_part("file", part))
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let listing: FileListResponse = app
        .server
        .get("/files")
        .add_header(AUTHORIZATION, app.bearer(subject_id))
        .await
        .json();
    listing
        .files
        .into_iter()
        .find(|f| f.original_name == name)
        .expect("uploaded file is listed")
}

#[tokio::test]
async fn test_listing_is_newest_first_and_owner_scoped() {
    let app = TestApp::new(MIB);
    upload(&app, 7, "first.txt", b"1").await;
    upload(&app, 7, "second.txt", b"2").await;
    upload(&app, 8, "theirs.txt", b"3").await;

    let listing: FileListResponse = app
        .server
        .get("/files")
        .add_header(AUTHORIZATION, app.bearer(7))
        .await
        .json();

    let names: Vec<&str> = listing
        .files
        .iter()
        .map(|f| f.original_name.as_str())
        .collect();
    assert_eq!(names, vec!["second.txt", "first.txt"]);
}

#[tokio::test]
async fn test_file_detail_is_hidden_from_other_subjects() {
    let app = TestApp::new(MIB);
    let file = upload(&app, 7, "diary.txt", b"dear diary").await;

    let own = app
        .server
        .get(&format!("/files/{}", file.id))
        .add_header(AUTHORIZATION, app.bearer(7))
        .await;
    own.assert_status_ok();
    let detail: FileResponse = own.json();
    assert_eq!(detail.original_name, "diary.txt");
    assert_eq!(detail.download_url, format!("/files/{}/download", file.id));

    for path in [
        format!("/files/{}", file.id),
        format!("/files/{}/download", file.id),
    ] {
        let response = app
            .server
            .get(&path)
            .add_header(AUTHORIZATION, app.bearer(8))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/files?error=NotFound");
    }
}

#[tokio::test]
async fn test_listing_another_subjects_folder_is_not_found() {
    let app = TestApp::new(MIB);
    app.seed_folder(3, 8, "private");

    let response = app
        .server
        .get("/files")
        .add_query_param("folderId", 3)
        .add_header(AUTHORIZATION, app.bearer(7))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_local_download_streams_bytes_as_attachment() {
    let app = TestApp::new(MIB);
    let file = upload(&app, 7, "notes.txt", b"remember the milk").await;

    let response = app
        .server
        .get(&format!("/files/{}/download", file.id))
        .add_header(AUTHORIZATION, app.bearer(7))
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), "remember the milk");
    assert_eq!(
        response.header(CONTENT_DISPOSITION),
        "attachment; filename=\"notes.txt\""
    );
}

#[tokio::test]
async fn test_download_redirects_when_backend_serves_directly() {
    let app = TestApp::with_direct_urls(MIB);
    let file = upload(&app, 7, "photo.txt", b"pixels").await;

    let response = app
        .server
        .get(&format!("/files/{}/download", file.id))
        .add_header(AUTHORIZATION, app.bearer(7))
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    let target = location(&response);
    let target = target.to_str().unwrap();
    assert!(target.starts_with("https://cdn.example.com/user_7/"));
    assert!(target.ends_with(".txt"));
}

#[tokio::test]
async fn test_malformed_ids_are_bad_requests() {
    let app = TestApp::new(MIB);

    let response = app
        .server
        .get("/files/abc")
        .add_header(AUTHORIZATION, app.bearer(7))
        .await;
    assert_eq!(location(&response), "/files?error=BadRequest");

    let response = app
        .server
        .get("/files")
        .add_query_param("folderId", "abc")
        .add_header(AUTHORIZATION, app.bearer(7))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_listing_requires_a_session() {
    let app = TestApp::new(MIB);

    let response = app
        .server
        .get("/files")
        .add_header(AUTHORIZATION, "Bearer not-a-token")
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?error=Unauthorized");
}
