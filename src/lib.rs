//! # webframe
//!
//! A small web-service scaffold on top of Axum: contextual structured logging,
//! a uniform error envelope for handlers and a router builder that wires the
//! request middleware from TOML configuration.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use axum::routing::get;
//! use webframe::{Config, FluentRouter, Logger, Result};
//!
//! async fn hello(logger: Logger) -> &'static str {
//!     logger.info("saying hello");
//!     "Hello, World!"
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::default(); // Loads from config/{RUST_ENV}.toml
//!     config.setup_tracing()?;
//!
//!     FluentRouter::without_state(config)?
//!         .route("/", get(hello))
//!         .setup_middleware()
//!         .await?
//!         .start()
//!         .await
//! }
//! ```
//!
//! With `config/dev.toml`:
//! ```toml
//! [http]
//! bind_port = 3000
//!
//! [logging]
//! app_name = "hello"
//! env = "{{ RUN_MODE }}"
//! ```
//!
//! Run with `RUST_ENV=dev cargo run`. With `RUN_MODE=production` the log lines
//! go to `logs/hello/log` and rotate by size; otherwise they go to stdout.
//!
//! # Logging
//!
//! A [`Logger`] is immutable. [`Logger::with`] returns a child that carries the
//! parent's fields plus new ones and shares the parent's sink. The request
//! middleware binds an enriched logger (path, method, request id) into a
//! [`Context`] in the request extensions; handlers extract either one:
//!
//! ```rust
//! use webframe::{Context, fields};
//!
//! async fn handler(ctx: Context) -> &'static str {
//!     let (logger, _ctx) = ctx.derive_and_enrich(fields!("order_id" => 42));
//!     logger.info("order loaded");
//!     "ok"
//! }
//! ```
//!
//! # Error Responses
//!
//! Handlers return [`Reply<T>`]. Business errors keep status 200 and encode a
//! JSON envelope; transport errors keep their status and a plain-text body:
//!
//! ```rust
//! use webframe::{BadRequestError, Reply};
//!
//! async fn create() -> Reply<&'static str> {
//!     Err(BadRequestError::new("参数错误").with_english("invalid argument").into())
//! }
//! ```
//!
//! ```json
//! {"rtnCode":"000400","rtnMsg":"参数错误","rtnMsgEnglish":"invalid argument","detailError":""}
//! ```
//!
//! The logging middleware reads the error back from the response and picks the
//! severity of its summary line from it, see [`Outcome`] and [`severity`].
//!
//! # Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | Configuration loading and validation ([`Config`]) |
//! | `log` | Fields, loggers, contexts and sinks ([`Logger`], [`Context`]) |
//! | `response_error` | Response error kinds and their encoding ([`ResponseError`]) |
//! | `fluent` | Router builder and middleware setup ([`FluentRouter`]) |
//! | `error` | Library error type ([`Error`]) |
//!
//! ## Middleware Control
//!
//! ```toml
//! [http]
//! Exclude = ["timeout"]
//! ```
mod config;
mod error;
mod fluent;
mod log;
mod response_error;
mod utils;

pub use config::*;
pub use error::*;
pub use fluent::*;
pub use log::*;
pub use response_error::*;
pub use utils::*;

pub type Result<T> = std::result::Result<T, Error>;
