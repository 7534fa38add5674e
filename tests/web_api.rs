//! HTTP 接口集成测试

#![cfg(feature = "web")]

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use htmldocx::builders::Orientation;
use htmldocx::core::DOCX_MEDIA_TYPE;
use htmldocx::web::{create_router, AppState, ImagesResponse, WebConfig};

mod common;

use common::{list_files, DocxInspector, ImageFixtures, TestEnvironment};

const BOUNDARY: &str = "htmldocx-test-boundary";

fn app(env: &TestEnvironment) -> Router {
    let uploads_dir = env.uploads_dir();
    let config = WebConfig {
        bind_addr: "127.0.0.1".to_string(),
        port: 3001,
        body_limit_mb: 8,
        images_dir: env.dirs.intermediate.root().to_path_buf(),
        out_images_dir: env.dirs.extracted.root().to_path_buf(),
        uploads_dir: uploads_dir.clone(),
        orientation: Orientation::Portrait,
    };
    let state = Arc::new(AppState::new(env.processor.clone(), uploads_dir));
    create_router(state, &config)
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(uri: &str, field: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"page.html\"\r\n\
         Content-Type: text/html\r\n\
         \r\n\
         {content}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec(), content_type)
}

fn error_message(body: &[u8]) -> String {
    let value: Value = serde_json::from_slice(body).unwrap();
    assert_eq!(value["status"], "error");
    value["error"].as_str().unwrap().to_string()
}

fn uploads_left(env: &TestEnvironment) -> Vec<PathBuf> {
    list_files(&env.uploads_dir())
}

#[tokio::test]
async fn test_convert_returns_docx() {
    let env = TestEnvironment::new();
    let html = format!(
        r#"<h1>Hello</h1><img src="{}">"#,
        ImageFixtures::png_data_url(3, 3)
    );

    let request = Request::builder()
        .method("POST")
        .uri("/convert")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "html": html }).to_string()))
        .unwrap();
    let response = app(&env).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        DOCX_MEDIA_TYPE
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap(),
        "attachment; filename=\"output.docx\""
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let inspector = DocxInspector::new(body.to_vec());
    assert!(inspector.html().contains("Hello"));
    assert_eq!(inspector.mht_parts().len(), 2);
    assert_eq!(env.intermediate_files().len(), 1);
}

#[tokio::test]
async fn test_convert_rejects_missing_html() {
    let env = TestEnvironment::new();

    for body in [json!({}), json!({ "html": "" })] {
        let (status, body, _) = send(app(&env), json_request("/convert", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), "HTML content is required");
    }
}

#[tokio::test]
async fn test_base64_to_png() {
    let env = TestEnvironment::new();
    let payload = ImageFixtures::jpeg_data_url(4, 2);

    let response = app(&env)
        .oneshot(json_request("/base64-to-png", json!({ "base64": payload })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"image.png\""
    );
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (4, 2));
    // 单张转换不落盘
    assert!(env.extracted_files().is_empty());
}

#[tokio::test]
async fn test_base64_to_png_rejects_bad_input() {
    let env = TestEnvironment::new();

    let (status, body, _) = send(app(&env), json_request("/base64-to-png", json!({ "base64": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Base64 content is required");

    let (status, body, _) = send(app(&env), json_request("/base64-to-png", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Base64 content is required");

    let (status, body, _) = send(
        app(&env),
        json_request("/base64-to-png", json!({ "base64": "iVBORw0KGgo" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Invalid Base64 content");
}

#[tokio::test]
async fn test_base64_to_png_undecodable_image() {
    let env = TestEnvironment::new();

    let (status, body, content_type) = send(
        app(&env),
        json_request("/base64-to-png", json!({ "base64": "data:image/png;base64,AAAA" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(error_message(&body), "Internal Server Error");
}

#[tokio::test]
async fn test_upload_converts_file() {
    let env = TestEnvironment::new();
    let html = format!(
        r#"<html><head><title>Upload</title></head><body><p>uploaded</p><img src="{}"></body></html>"#,
        ImageFixtures::png_data_url(2, 2)
    );

    let (status, body, content_type) =
        send(app(&env), multipart_request("/upload", "file", &html)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(DOCX_MEDIA_TYPE));
    let inspector = DocxInspector::new(body);
    assert!(inspector.html().contains("uploaded"));
    assert_eq!(inspector.mht_parts().len(), 2);
    assert!(uploads_left(&env).is_empty());
}

#[tokio::test]
async fn test_upload_images_returns_public_paths() {
    let env = TestEnvironment::new();
    let html = format!(
        r#"<img src="{}"><img src="/static/logo.png"><img src="{}">"#,
        ImageFixtures::png_data_url(2, 2),
        ImageFixtures::jpeg_data_url(2, 2),
    );

    let (status, body, _) = send(app(&env), multipart_request("/upload-images", "file", &html)).await;

    assert_eq!(status, StatusCode::OK);
    let response: ImagesResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(response.images.len(), 2);
    assert!(response
        .images
        .iter()
        .all(|path| path.starts_with("/out_images/") && path.ends_with(".png")));
    assert_eq!(env.extracted_files().len(), 2);
    assert!(uploads_left(&env).is_empty());

    // 提取出的图片可以通过公开路径访问
    let request = Request::builder()
        .uri(response.images[0].as_str())
        .body(Body::empty())
        .unwrap();
    let (status, bytes, _) = send(app(&env), request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(image::load_from_memory(&bytes).is_ok());
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let env = TestEnvironment::new();

    for uri in ["/upload", "/upload-images"] {
        let (status, body, _) = send(app(&env), multipart_request(uri, "attachment", "<p>x</p>")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), "No file uploaded");
    }
    assert!(uploads_left(&env).is_empty());
}

#[tokio::test]
async fn test_upload_empty_file_is_rejected() {
    let env = TestEnvironment::new();

    let (status, body, _) = send(app(&env), multipart_request("/upload", "file", "")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Uploaded file is empty");
    assert!(uploads_left(&env).is_empty());
}

#[tokio::test]
async fn test_health() {
    let env = TestEnvironment::new();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body, _) = send(app(&env), request).await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}
