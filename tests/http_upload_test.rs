//! HTTP-level tests for the upload router.
//!
//! Run with: `cargo test --test http_upload_test`

use axum::http::StatusCode;
use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use bytes::Bytes;
use serde_json::Value;
use tempfile::TempDir;
use upload_toolkit::{UploadConfiguration, UploadService, routes::routes::routes};

fn create_minimal_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
        0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0x89, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}

struct TestApp {
    server: TestServer,
    dir: TempDir,
}

fn setup_test_app(config: UploadConfiguration) -> TestApp {
    let dir = TempDir::new().unwrap();
    let service = UploadService::new(dir.path(), config);
    let app = routes(10 * 1024 * 1024).with_state(service);
    TestApp {
        server: TestServer::new(app).unwrap(),
        dir,
    }
}

fn png_form(file_name: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(create_minimal_png())
            .file_name(file_name)
            .mime_type("image/png"),
    )
}

#[tokio::test]
async fn test_upload_files_without_rename() {
    let app = setup_test_app(UploadConfiguration::new(["image/jpeg", "image/png"], false));

    let response = app.server.post("/upload").multipart(png_form("img.png")).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["error"], false);
    assert_eq!(body["files"][0]["original_name"], "img.png");
    assert_eq!(body["files"][0]["new_name"], "img.png");
    assert_eq!(body["files"][0]["size_bytes"], create_minimal_png().len());
    assert_eq!(body["files"][0]["content_type"], "image/png");

    let on_disk = std::fs::read(app.dir.path().join("img.png")).unwrap();
    assert_eq!(on_disk, create_minimal_png());
}

#[tokio::test]
async fn test_upload_files_with_rename() {
    let app = setup_test_app(UploadConfiguration::new(["image/jpeg", "image/png"], true));

    let response = app.server.post("/upload").multipart(png_form("img.png")).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let new_name = body["files"][0]["new_name"].as_str().unwrap().to_string();
    assert_ne!(new_name, "img.png");
    assert!(new_name.ends_with(".png"));
    assert!(app.dir.path().join(&new_name).exists());
}

#[tokio::test]
async fn test_disallowed_type_is_415() {
    let app = setup_test_app(UploadConfiguration::new(["image/jpeg"], false));

    let response = app.server.post("/upload").multipart(png_form("img.png")).await;

    assert_eq!(response.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: Value = response.json();
    assert_eq!(body["error"], true);
    assert_eq!(std::fs::read_dir(app.dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_oversized_file_is_413() {
    let app = setup_test_app(UploadConfiguration::default().with_max_file_size(10));

    let response = app.server.post("/upload").multipart(png_form("img.png")).await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_truncated_multipart_is_400() {
    let app = setup_test_app(UploadConfiguration::default());

    let boundary = "TRUNCATED-BOUNDARY";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"img.png\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(&create_minimal_png());

    let response = app
        .server
        .post("/upload")
        .content_type(&format!("multipart/form-data; boundary={boundary}"))
        .bytes(Bytes::from(body))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], true);
    assert_eq!(std::fs::read_dir(app.dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_one_with_empty_file_input_is_400() {
    let app = setup_test_app(UploadConfiguration::default());

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(Vec::new())
            .file_name("")
            .mime_type("application/octet-stream"),
    );
    let response = app.server.post("/upload/one").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(app.dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_upload_one_without_file_is_400() {
    let app = setup_test_app(UploadConfiguration::default());

    let form = MultipartForm::new().add_text("title", "no file here");
    let response = app.server.post("/upload/one").multipart(form).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_one_then_download() {
    let app = setup_test_app(UploadConfiguration::default());

    let response = app
        .server
        .post("/upload/one")
        .multipart(png_form("holiday.png"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let new_name = body["file"]["new_name"].as_str().unwrap().to_string();
    assert_ne!(new_name, "holiday.png");

    let download = app.server.get(&format!("/files/{new_name}")).await;
    assert_eq!(download.status_code(), StatusCode::OK);
    assert_eq!(
        download.header("content-disposition"),
        format!("attachment; filename=\"{new_name}\"").as_str()
    );
    assert_eq!(
        download.header("content-length"),
        create_minimal_png().len().to_string().as_str()
    );
    assert_eq!(download.as_bytes().to_vec(), create_minimal_png());
}

#[tokio::test]
async fn test_download_missing_file_is_404() {
    let app = setup_test_app(UploadConfiguration::default());

    let response = app.server.get("/files/nope.pdf").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_probes() {
    let app = setup_test_app(UploadConfiguration::default());

    let healthz = app.server.get("/healthz").await;
    assert_eq!(healthz.status_code(), StatusCode::OK);

    let readyz = app.server.get("/readyz").await;
    assert_eq!(readyz.status_code(), StatusCode::OK);
    let body: Value = readyz.json();
    assert_eq!(body["checks"]["disk"]["ok"], true);
    assert_eq!(std::fs::read_dir(app.dir.path()).unwrap().count(), 0);
}
