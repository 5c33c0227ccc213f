use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::json;
use tower::ServiceExt;

use qrgen_backend::config::AppConfig;
use qrgen_backend::features::qr::create_qr_router;
use qrgen_backend::state::AppState;

fn test_app() -> Router {
    let state = AppState::new(AppConfig::default());
    Router::new()
        .nest("/qr", create_qr_router())
        .with_state(state)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

#[tokio::test]
async fn generate_url_returns_png_attachment() {
    let app = test_app();

    let req = post_json(
        "/qr/generate",
        json!({ "type": "url", "data": { "url": "https://example.com" } }),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .expect("content type")
            .to_str()
            .expect("header str"),
        "image/png"
    );

    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .expect("content disposition")
        .to_str()
        .expect("header str")
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"qrcode-"));
    assert!(disposition.ends_with(".png\""));

    assert_eq!(
        resp.headers()
            .get(header::CACHE_CONTROL)
            .expect("cache control")
            .to_str()
            .expect("header str"),
        "no-cache, no-store, must-revalidate"
    );

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn generate_rejects_invalid_url_with_problem_details() {
    let app = test_app();

    let req = post_json(
        "/qr/generate",
        json!({ "type": "url", "data": { "url": "not a url at all" } }),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .expect("content type")
            .to_str()
            .expect("header str"),
        "application/problem+json"
    );

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(v["code"], "VALIDATION_FAILED");
    assert_eq!(v["reason"], "INVALID_URL");
}

#[tokio::test]
async fn generate_rejects_unknown_payload_type() {
    let app = test_app();

    let req = post_json(
        "/qr/generate",
        json!({ "type": "barcode", "data": { "text": "hi" } }),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(v["reason"], "UNSUPPORTED_TYPE");
}

#[tokio::test]
async fn generate_svg_endpoint_forces_vector_output() {
    let app = test_app();

    // options 里写 png 也会被覆盖为 svg
    let req = post_json(
        "/qr/generate-svg",
        json!({
            "type": "text",
            "data": { "text": "hello" },
            "options": { "format": "png", "size": 128 }
        }),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .expect("content type")
            .to_str()
            .expect("header str"),
        "image/svg+xml; charset=utf-8"
    );

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let text = String::from_utf8(bytes.to_vec()).expect("utf8 svg");
    assert!(text.starts_with("<?xml"));
    assert!(text.contains("<svg"));
}

#[tokio::test]
async fn generate_svg_with_logo_is_rejected() {
    let app = test_app();

    let req = post_json(
        "/qr/generate",
        json!({
            "type": "text",
            "data": { "text": "hello" },
            "options": { "format": "svg" },
            "logo": "aGVsbG8="
        }),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(v["code"], "LOGO_UNSUPPORTED");
}

#[tokio::test]
async fn generate_rejects_undecodable_logo() {
    let app = test_app();

    // base64 合法但不是图片
    let req = post_json(
        "/qr/generate",
        json!({
            "type": "text",
            "data": { "text": "hello" },
            "logo": "aGVsbG8gd29ybGQ="
        }),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(v["code"], "LOGO_INVALID");
}

#[tokio::test]
async fn preview_normalizes_url_leniently() {
    let app = test_app();

    let req = post_json(
        "/qr/preview",
        json!({ "type": "url", "data": { "url": "example.com" } }),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(v["payload"], "https://example.com");
}

#[tokio::test]
async fn preview_formats_wifi_payload() {
    let app = test_app();

    let req = post_json(
        "/qr/preview",
        json!({
            "type": "wifi",
            "data": { "ssid": "MyNetwork", "password": "secret", "security": "WPA" }
        }),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(v["payload"], "WIFI:T:WPA;S:MyNetwork;P:secret;H:false;;");
}

#[tokio::test]
async fn generate_rejects_zero_size_options() {
    let app = test_app();

    let req = post_json(
        "/qr/generate",
        json!({
            "type": "text",
            "data": { "text": "hello" },
            "options": { "size": 0 }
        }),
    );
    let resp = app.oneshot(req).await.expect("call app");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse json");
    assert_eq!(v["code"], "OPTIONS_INVALID");
}
