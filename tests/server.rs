mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::*;
use id_redact::config::ServerConfig;
use id_redact::server::{router, AppState};
use id_redact::Redactor;
use image::{GenericImageView, ImageFormat};
use tower::util::ServiceExt;

const BOUNDARY: &str = "----id-redact-test-boundary";

fn app(redactor: Redactor) -> Router {
    let state = AppState {
        redactor: Arc::new(redactor),
    };
    router(state, &ServerConfig::default()).unwrap()
}

fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn upload_returns_redacted_png_attachment() {
    let app = app(redactor(&["ABCDE1234F"], vec![], vec![]));
    let png = encoded(&white_image(), ImageFormat::Png);

    let response = app
        .oneshot(upload_request(multipart_body("file", "card.png", "image/png", &png)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"card_masked.png\""
    );

    let bytes = body_bytes(response).await;
    let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
    assert_eq!(decoded.dimensions(), (WIDTH, HEIGHT));
    assert_eq!(decoded.get_pixel(10, 10).0[0], 0);
}

#[tokio::test]
async fn jpeg_upload_comes_back_as_jpeg() {
    let app = app(redactor(&["ABCDE1234F"], vec![], vec![]));
    let jpeg = encoded(&white_image(), ImageFormat::Jpeg);

    let response = app
        .oneshot(upload_request(multipart_body("file", "id.jpg", "image/jpeg", &jpeg)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let bytes = body_bytes(response).await;
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
}

#[tokio::test]
async fn undecodable_upload_is_bad_request() {
    let app = app(redactor(&[], vec![], vec![]));

    let response = app
        .oneshot(upload_request(multipart_body("file", "x.png", "image/png", b"garbage")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let app = app(redactor(&[], vec![], vec![]));
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n");
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let response = app.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn collaborator_failure_returns_no_image() {
    let redactor = Redactor::new(
        Arc::new(FakeOcr(ocr_output(&["ABCDE1234F"]))),
        Arc::new(FakeFaces(vec![])),
        Arc::new(FailingNer),
    );
    let png = encoded(&white_image(), ImageFormat::Png);

    let response = app(redactor)
        .oneshot(upload_request(multipart_body("file", "card.png", "image/png", &png)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app(redactor(&[], vec![], vec![]));
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "ok");
}
