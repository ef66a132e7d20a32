//! Request logging and outcome classification.
//!
//! The middleware derives a per-request logger from the context already on
//! the request (or from the router's root logger), binds it into a fresh
//! [`Context`] stored in the request extensions, runs the inner service and
//! writes one summary line whose severity follows the handler's outcome.
//!
//! Failures produced outside the error taxonomy (extractor rejections, the
//! fallback 404, request timeouts) reach the client unchanged but are logged
//! as unknown errors carrying the response text.

use {
    crate::{
        Context, Logger, ResponseError, UnknownError, fields, response_error::SUCCESS_CODE,
        utils::X_REQUEST_ID,
    },
    axum::{
        body::{self, Body, HttpBody},
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    std::time::Instant,
    tracing::Level,
};

/// Largest unrecorded failure body read back for the summary line.
const MAX_FAILURE_BODY: usize = 16 * 1024;

/// Terminal state of a request as seen by the logging middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler returned without recording an error.
    Success,
    /// A business error with a readable code.
    KnownError,
    /// A transport error answered with its literal status.
    StandardHttpError,
    /// Anything else.
    UnknownError,
}

impl Outcome {
    /// Maps the error recorded on a response, if any, to an outcome.
    pub fn of(error: Option<&ResponseError>) -> Outcome {
        match error {
            None => Outcome::Success,
            Some(ResponseError::BadRequest(_) | ResponseError::InternalServer(_)) => {
                Outcome::KnownError
            }
            Some(ResponseError::StandardHttp(_)) => Outcome::StandardHttpError,
            Some(ResponseError::Unknown(_)) => Outcome::UnknownError,
        }
    }
}

/// Severity of the summary line for an outcome.
///
/// Known errors are logged at info only when their code is the success code;
/// any other code is an error, except bad requests when
/// `client_errors_as_warn` is set.
pub fn severity(error: Option<&ResponseError>, client_errors_as_warn: bool) -> Level {
    match (Outcome::of(error), error) {
        (Outcome::Success, _) => Level::INFO,
        (Outcome::KnownError, Some(err)) if err.code() == Some(SUCCESS_CODE) => Level::INFO,
        (Outcome::KnownError, Some(ResponseError::BadRequest(_))) if client_errors_as_warn => {
            Level::WARN
        }
        _ => Level::ERROR,
    }
}

/// Middleware function installed by [`FluentRouter::setup_logging`](crate::FluentRouter::setup_logging).
pub(crate) async fn log_request(
    State(root): State<Logger>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();

    let parent = match request.extensions().get::<Context>() {
        Some(context) => context.clone(),
        None => Context::new().bind(root),
    };

    let mut request_fields = fields!(
        "path" => request.uri().path(),
        "method" => request.method().as_str(),
    );
    if let Some(request_id) = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
    {
        request_fields.insert("request_id", request_id);
    }

    let (_, context) = parent.derive_and_enrich(request_fields);
    request.extensions_mut().insert(context.clone());

    let (response, error) = recorded_error(next.run(request).await).await;

    let logger = context.logger().with(fields!(
        "latency" => format!("{}ms", started.elapsed().as_millis()),
        "status" => response.status().as_u16(),
    ));
    log_outcome(&logger, error.as_ref());
    response
}

/// Returns the error a handler recorded on the response. A 4xx or 5xx
/// response without one is reported as an [`UnknownError`] whose detail is
/// the response text, or the status when the body is empty or too large.
async fn recorded_error(response: Response) -> (Response, Option<ResponseError>) {
    if let Some(err) = response.extensions().get::<ResponseError>() {
        let err = err.clone();
        return (response, Some(err));
    }

    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return (response, None);
    }

    let (parts, response_body) = response.into_parts();
    let readable = response_body
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= MAX_FAILURE_BODY as u64);
    if !readable {
        let err = UnknownError::new(status).into();
        return (Response::from_parts(parts, response_body), Some(err));
    }

    let bytes = body::to_bytes(response_body, MAX_FAILURE_BODY)
        .await
        .unwrap_or_default();
    let text = String::from_utf8_lossy(&bytes);
    let err = match text.trim() {
        "" => UnknownError::new(status),
        detail => UnknownError::new(detail),
    };
    (Response::from_parts(parts, Body::from(bytes)), Some(err.into()))
}

fn log_outcome(logger: &Logger, error: Option<&ResponseError>) {
    let level = severity(error, logger.config().client_errors_as_warn);
    let Some(err) = error else {
        logger.log(level, "request succeeded");
        return;
    };

    let logger = match err.code() {
        Some(code) => logger.with(fields!("code" => code)),
        None => logger.clone(),
    };
    match Outcome::of(error) {
        Outcome::KnownError => logger.log(level, format_args!("request failed: {err}")),
        _ => logger.log(level, format_args!("request failed with an unknown error: {err}")),
    }
}
