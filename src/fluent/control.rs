//! Traffic control middleware: panic catching.

use super::router::FluentRouter;
use crate::{HttpMiddleware, StandardHttpError, fields};

use {
    axum::response::IntoResponse,
    http::StatusCode,
    std::any::Any,
    tower_http::catch_panic::CatchPanicLayer,
};

impl<State> FluentRouter<State>
where
    State: Clone + Send + Sync + 'static,
{
    /// Sets up panic catching middleware.
    ///
    /// Catches panics in request handlers and returns a `500 Internal Server Error`
    /// response instead of crashing the server. The panic message is logged at
    /// error level through the root logger.
    ///
    /// The response carries a [`StandardHttpError`], so when this layer sits
    /// inside [`setup_logging`](Self::setup_logging), as `setup_middleware()`
    /// places it, the request still gets its summary line with the request
    /// fields.
    #[must_use]
    pub fn setup_catch_panic(mut self) -> Self {
        if !self.is_middleware_enabled(HttpMiddleware::CatchPanic) {
            return self;
        }

        let logger = self.logger.clone();
        self.inner = self.inner.layer(CatchPanicLayer::custom(
            move |err: Box<dyn Any + Send + 'static>| {
                let msg = if let Some(s) = err.downcast_ref::<String>() {
                    s.clone()
                } else if let Some(s) = err.downcast_ref::<&str>() {
                    s.to_string()
                } else {
                    "unable to downcast the panic payload".to_string()
                };

                logger
                    .with(fields!("status" => StatusCode::INTERNAL_SERVER_ERROR.as_u16()))
                    .error(format_args!("Service panicked: {msg}"));

                StandardHttpError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                    .into_response()
            },
        ));
        self
    }
}
