//! Tests for panic catching middleware setup

use crate::{
    FluentRouter, HttpMiddleware,
    fluent::tests::{create_base_config, get_body_string, get_request},
    log::testing::CapturedLogs,
};
use axum::{Router, http::StatusCode, routing::get};
use tower::Service;

fn panic_router() -> Router {
    Router::new()
        .route(
            "/panic",
            get(|| async {
                panic!("Test panic!");
                #[allow(unreachable_code)]
                "This will never be reached"
            }),
        )
        .route(
            "/panic-string",
            get(|| async {
                let detail = String::from("owned message");
                panic!("{}", detail);
                #[allow(unreachable_code)]
                "unreachable"
            }),
        )
        .route("/normal", get(|| async { "OK" }))
}

#[tokio::test]
async fn test_setup_catch_panic_with_panic() {
    let logs = CapturedLogs::default();
    let config = create_base_config();
    let mut app = FluentRouter::without_state(config.clone())
        .unwrap()
        .with_logger(logs.logger(config.logging))
        .merge(panic_router())
        .setup_catch_panic()
        .into_inner();

    let response = app.call(get_request("/panic")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(get_body_string(response).await, "Internal Server Error");

    let lines = logs.json_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "ERROR");
    assert_eq!(lines[0]["fields"]["message"], "Service panicked: Test panic!");
    assert_eq!(lines[0]["fields"]["context"], "status=500");
}

#[tokio::test]
async fn test_catch_panic_with_string_panic() {
    let logs = CapturedLogs::default();
    let config = create_base_config();
    let mut app = FluentRouter::without_state(config.clone())
        .unwrap()
        .with_logger(logs.logger(config.logging))
        .merge(panic_router())
        .setup_catch_panic()
        .into_inner();

    let response = app.call(get_request("/panic-string")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        logs.json_lines()[0]["fields"]["message"],
        "Service panicked: owned message"
    );
}

#[tokio::test]
async fn test_setup_catch_panic_normal_request() {
    let logs = CapturedLogs::default();
    let config = create_base_config();
    let mut app = FluentRouter::without_state(config.clone())
        .unwrap()
        .with_logger(logs.logger(config.logging))
        .merge(panic_router())
        .setup_catch_panic()
        .into_inner();

    let response = app.call(get_request("/normal")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_string(response).await, "OK");
    assert!(logs.json_lines().is_empty());
}

#[tokio::test]
async fn test_panics_inside_logged_requests_are_caught() {
    let logs = CapturedLogs::default();
    let config = create_base_config();
    let mut app = FluentRouter::without_state(config.clone())
        .unwrap()
        .with_logger(logs.logger(config.logging))
        .merge(panic_router())
        .setup_middleware()
        .await
        .unwrap()
        .into_inner();

    let response = app.call(get_request("/panic")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // the app keeps serving
    let response = app.call(get_request("/normal")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn test_catch_panic_can_be_excluded() {
    let config = create_base_config().with_excluded_middlewares(vec![HttpMiddleware::CatchPanic]);
    let router = FluentRouter::without_state(config).unwrap();
    assert!(!router.is_middleware_enabled(HttpMiddleware::CatchPanic));
}
