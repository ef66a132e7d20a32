//! Tests for liveness and readiness probes

use crate::{
    FluentRouter, HttpMiddleware,
    fluent::tests::{create_base_config, get_body_string, get_request},
};
use axum::http::StatusCode;
use tower::ServiceExt;

#[tokio::test]
async fn test_probes_answer_ok() {
    let app = FluentRouter::without_state(create_base_config())
        .unwrap()
        .setup_liveness_readiness()
        .into_inner();

    for route in ["/health", "/ready"] {
        let response = app.clone().oneshot(get_request(route)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{route}");
        assert_eq!(get_body_string(response).await, "OK\n");
    }
}

#[tokio::test]
async fn test_liveness_readiness_individual_control() {
    let config =
        create_base_config().with_included_middlewares(vec![HttpMiddleware::Liveness]);
    let app = FluentRouter::without_state(config)
        .unwrap()
        .setup_liveness_readiness()
        .into_inner();

    let response = app.clone().oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_custom_probe_routes() {
    let config = create_base_config()
        .with_liveness_route("/livez")
        .with_readiness_route("/readyz");
    let app = FluentRouter::without_state(config)
        .unwrap()
        .setup_liveness_readiness()
        .into_inner();

    let response = app.clone().oneshot(get_request("/livez")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.oneshot(get_request("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
