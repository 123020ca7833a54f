use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    routing::get,
};
use tower::ServiceExt;

async fn ok_handler() -> &'static str {
    "ok"
}

async fn fail_handler() -> Result<&'static str, og_backend::AppError> {
    Err(og_backend::AppError::FontLoad("Inter-Black.ttf".into()))
}

fn build_app() -> Router {
    Router::new()
        .route("/ok", get(ok_handler))
        .route("/fail", get(fail_handler))
        .layer(axum::middleware::from_fn(
            og_backend::request_id::request_id_middleware,
        ))
}

fn header_value(resp: &axum::response::Response) -> String {
    resp.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[tokio::test]
async fn request_id_is_generated_when_missing() {
    let app = build_app();
    let resp = app
        .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
        .await
        .expect("request /ok");

    assert_eq!(resp.status(), StatusCode::OK);
    let request_id = header_value(&resp);
    assert!(request_id.starts_with("req_"), "got {request_id:?}");
}

#[tokio::test]
async fn request_id_uses_client_value_when_valid() {
    let app = build_app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/ok")
                .header("x-request-id", "client.req-001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /ok");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_value(&resp), "client.req-001");
}

#[tokio::test]
async fn invalid_client_value_is_replaced() {
    let app = build_app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/ok")
                .header("x-request-id", "not valid/value")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /ok");

    let request_id = header_value(&resp);
    assert_ne!(request_id, "not valid/value");
    assert!(request_id.starts_with("req_"));
}

#[tokio::test]
async fn error_body_stays_message_only_with_request_id_header() {
    let app = build_app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/fail")
                .header("x-request-id", "err.req-001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("request /fail");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header_value(&resp), "err.req-001");

    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("parse json");
    assert_eq!(json, serde_json::json!({ "message": "字体资源加载失败: Inter-Black.ttf" }));
}
