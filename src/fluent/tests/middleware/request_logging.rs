//! Tests for the request logging middleware and error classification

use crate::{
    BadRequestError, Context, FluentRouter, HttpMiddleware, InternalServerError, Logger, Reply,
    StandardHttpError, fields,
    fluent::tests::{
        create_base_config, create_config_with_toml, create_logged_router, get_body_string,
        get_request, request_with_id,
    },
    log::testing::CapturedLogs,
};
use axum::{Router, extract::Path, http::StatusCode, routing::get};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

fn summary_line(logs: &CapturedLogs) -> Value {
    let lines = logs.json_lines();
    let summaries: Vec<_> = lines
        .into_iter()
        .filter(|line| {
            line["fields"]["message"]
                .as_str()
                .is_some_and(|msg| msg.starts_with("request "))
        })
        .collect();
    assert_eq!(summaries.len(), 1, "expected exactly one summary line");
    summaries.into_iter().next().unwrap()
}

fn context_of(line: &Value) -> &str {
    line["fields"]["context"].as_str().unwrap()
}

async fn invalid_id() -> Reply<&'static str> {
    Err(BadRequestError::new("invalid id").into())
}

#[tokio::test]
async fn test_success_passes_through_and_logs_info() {
    let routes = Router::new().route("/ok", get(|| async { "fine" }));
    let (app, logs) = create_logged_router(create_base_config(), routes).await;

    let response = app.oneshot(get_request("/ok")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_body_string(response).await, "fine");

    let line = summary_line(&logs);
    assert_eq!(line["level"], "INFO");
    assert_eq!(line["fields"]["message"], "request succeeded");
    assert_eq!(line["fields"]["app"], "test-app");

    let context = context_of(&line);
    assert!(context.contains("path=/ok"), "{context}");
    assert!(context.contains("method=GET"), "{context}");
    assert!(context.contains("status=200"), "{context}");
    assert!(context.contains("request_id="), "{context}");

    // whole milliseconds, e.g. latency=0ms
    let latency = context
        .split(' ')
        .find_map(|pair| pair.strip_prefix("latency="))
        .unwrap();
    let millis = latency.strip_suffix("ms").unwrap();
    assert!(millis.parse::<u128>().is_ok(), "latency was {latency}");
}

#[tokio::test]
async fn test_bad_request_is_200_envelope_logged_as_error() {
    let routes = Router::new().route("/users", get(invalid_id));
    let (app, logs) = create_logged_router(create_base_config(), routes).await;

    let response = app.oneshot(get_request("/users")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(
        get_body_string(response).await,
        r#"{"rtnCode":"000400","rtnMsg":"invalid id","rtnMsgEnglish":"","detailError":""}"#
    );

    let line = summary_line(&logs);
    assert_eq!(line["level"], "ERROR");
    assert_eq!(
        line["fields"]["message"],
        "request failed: BadRequest! code: '000400', reason: invalid id"
    );
    assert!(context_of(&line).contains("code=000400"));
}

#[tokio::test]
async fn test_client_errors_can_be_logged_as_warn() {
    let config = create_config_with_toml("client_errors_as_warn = true");
    let routes = Router::new().route("/users", get(invalid_id));
    let (app, logs) = create_logged_router(config, routes).await;

    app.oneshot(get_request("/users")).await.unwrap();
    assert_eq!(summary_line(&logs)["level"], "WARN");
}

#[tokio::test]
async fn test_internal_error_is_200_envelope_with_detail() {
    async fn handler() -> Reply<&'static str> {
        let err = InternalServerError::new("数据库错误")
            .with_english("database error")
            .with_detail("connection reset");
        Err(err.into())
    }

    let routes = Router::new().route("/orders", get(handler));
    let (app, logs) = create_logged_router(create_base_config(), routes).await;

    let response = app.oneshot(get_request("/orders")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        get_body_string(response).await,
        r#"{"rtnCode":"000500","rtnMsg":"数据库错误","rtnMsgEnglish":"database error","detailError":"connection reset"}"#
    );

    let line = summary_line(&logs);
    assert_eq!(line["level"], "ERROR");
    assert!(context_of(&line).contains("code=000500"));
}

#[tokio::test]
async fn test_standard_http_error_keeps_status_and_plain_text() {
    async fn handler() -> Reply<&'static str> {
        Err(StandardHttpError::new(StatusCode::NOT_FOUND, "not found").into())
    }

    let routes = Router::new().route("/missing", get(handler));
    let (app, logs) = create_logged_router(create_base_config(), routes).await;

    let response = app.oneshot(get_request("/missing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(get_body_string(response).await, "not found");

    let line = summary_line(&logs);
    assert_eq!(line["level"], "ERROR");
    let message = line["fields"]["message"].as_str().unwrap();
    assert!(
        message.starts_with("request failed with an unknown error"),
        "{message}"
    );
    assert!(context_of(&line).contains("status=404"));
    assert!(!context_of(&line).contains("code="));
}

#[tokio::test]
async fn test_unclassified_error_is_wrapped() {
    async fn handler() -> Reply<&'static str> {
        Err(std::io::Error::other("boom").into())
    }

    let routes = Router::new().route("/boom", get(handler));
    let (app, logs) = create_logged_router(create_base_config(), routes).await;

    let response = app.oneshot(get_request("/boom")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        get_body_string(response).await,
        r#"{"rtnCode":"999999","rtnMsg":"发生未知错误","rtnMsgEnglish":"An unknown error occurred","detailError":"boom"}"#
    );

    let line = summary_line(&logs);
    assert_eq!(line["level"], "ERROR");
    assert_eq!(
        line["fields"]["message"],
        "request failed with an unknown error: UnknownError! code: '999999', reason: boom"
    );
    assert!(context_of(&line).contains("code=999999"));
}

#[tokio::test]
async fn test_timed_out_request_is_logged() {
    let config = create_base_config().with_request_timeout(Duration::from_millis(50));
    let routes = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            "too late"
        }),
    );
    let (app, logs) = create_logged_router(config, routes).await;

    let response = app.oneshot(get_request("/slow")).await.unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    let line = summary_line(&logs);
    assert_eq!(line["level"], "ERROR");
    assert_eq!(
        line["fields"]["message"],
        "request failed with an unknown error: UnknownError! code: '999999', reason: 408 Request Timeout"
    );
    let context = context_of(&line);
    assert!(context.contains("path=/slow"), "{context}");
    assert!(context.contains("status=408"), "{context}");
}

#[tokio::test]
async fn test_extractor_rejection_is_logged_as_unknown() {
    async fn order(Path(id): Path<u64>) -> String {
        format!("order {id}")
    }

    let routes = Router::new().route("/orders/{id}", get(order));
    let (app, logs) = create_logged_router(create_base_config(), routes).await;

    let response = app.oneshot(get_request("/orders/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = get_body_string(response).await;
    assert!(body.contains("Cannot parse"), "{body}");

    let line = summary_line(&logs);
    assert_eq!(line["level"], "ERROR");
    assert_eq!(
        line["fields"]["message"],
        format!("request failed with an unknown error: UnknownError! code: '999999', reason: {body}")
    );
    let context = context_of(&line);
    assert!(context.contains("status=400"), "{context}");
    assert!(context.contains("code=999999"), "{context}");
}

#[tokio::test]
async fn test_unknown_route_is_logged_as_error() {
    let (app, logs) = create_logged_router(create_base_config(), Router::new()).await;

    let response = app.oneshot(get_request("/nowhere")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let line = summary_line(&logs);
    assert_eq!(line["level"], "ERROR");
    assert!(context_of(&line).contains("path=/nowhere"));
}

#[tokio::test]
async fn test_panicking_handler_gets_a_summary_line() {
    async fn explode() -> &'static str {
        panic!("kaboom");
    }

    let routes = Router::new().route("/explode", get(explode));
    let (app, logs) = create_logged_router(create_base_config(), routes).await;

    let response = app
        .oneshot(request_with_id("GET", "/explode", "req-9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(get_body_string(response).await, "Internal Server Error");

    let lines = logs.json_lines();
    assert!(
        lines
            .iter()
            .any(|line| line["fields"]["message"] == "Service panicked: kaboom")
    );

    let line = summary_line(&logs);
    assert_eq!(line["level"], "ERROR");
    assert_eq!(
        line["fields"]["message"],
        "request failed with an unknown error: StandardHttpError! httpCode: '500', reason: Internal Server Error"
    );
    let context = context_of(&line);
    assert!(context.contains("path=/explode"), "{context}");
    assert!(context.contains("request_id=req-9"), "{context}");
    assert!(context.contains("status=500"), "{context}");
}

#[tokio::test]
async fn test_handlers_log_with_request_fields() {
    async fn handler(logger: Logger, ctx: Context) -> &'static str {
        logger.info("loading order");
        let (child, _) = ctx.derive_and_enrich(fields!("order_id" => 7));
        child.info("order loaded");
        "ok"
    }

    let routes = Router::new().route("/orders/7", get(handler));
    let (app, logs) = create_logged_router(create_base_config(), routes).await;

    app.oneshot(request_with_id("GET", "/orders/7", "req-42"))
        .await
        .unwrap();

    let lines = logs.json_lines();
    let loading = lines
        .iter()
        .find(|line| line["fields"]["message"] == "loading order")
        .unwrap();
    assert_eq!(
        context_of(loading),
        "path=/orders/7 method=GET request_id=req-42"
    );

    let loaded = lines
        .iter()
        .find(|line| line["fields"]["message"] == "order loaded")
        .unwrap();
    assert_eq!(
        context_of(loaded),
        "path=/orders/7 method=GET request_id=req-42 order_id=7"
    );
}

#[tokio::test]
async fn test_generated_request_id_reaches_the_log() {
    let routes = Router::new().route("/ok", get(|| async { "fine" }));
    let (app, logs) = create_logged_router(create_base_config(), routes).await;

    let response = app.oneshot(get_request("/ok")).await.unwrap();
    let request_id = response
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let line = summary_line(&logs);
    assert!(context_of(&line).contains(&format!("request_id={request_id}")));
}

#[tokio::test]
async fn test_probes_are_not_logged() {
    let (app, logs) = create_logged_router(create_base_config(), Router::new()).await;

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        logs.json_lines()
            .iter()
            .all(|line| line["fields"]["message"] != "request succeeded")
    );
}

#[tokio::test]
async fn test_logging_can_be_excluded() {
    let logs = CapturedLogs::default();
    let config =
        create_base_config().with_excluded_middlewares(vec![HttpMiddleware::Logging]);
    let app = FluentRouter::without_state(config.clone())
        .unwrap()
        .with_logger(logs.logger(config.logging.clone()))
        .route("/ok", get(|| async { "fine" }))
        .setup_logging()
        .into_inner();

    app.oneshot(get_request("/ok")).await.unwrap();
    assert!(logs.json_lines().is_empty());
}

#[tokio::test]
async fn test_outer_context_is_reused() {
    // a context placed on the request before the middleware is the parent
    let logs = CapturedLogs::default();
    let config = create_base_config();
    let root = logs.logger(config.logging.clone());
    let tenant = root.with(fields!("tenant" => "acme"));

    let app = FluentRouter::without_state(config)
        .unwrap()
        .with_logger(root)
        .route("/ok", get(|| async { "fine" }))
        .setup_logging()
        .layer(axum::Extension(Context::new().bind(tenant)))
        .into_inner();

    app.oneshot(get_request("/ok")).await.unwrap();
    let line = summary_line(&logs);
    assert!(context_of(&line).starts_with("tenant=acme path=/ok"));
}
