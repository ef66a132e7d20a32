//! FluentRouter and middleware configuration.
//!
//! The functionality is split across submodules:
//!
//! - [`router`] - Core `FluentRouter` struct and initialization
//! - [`observability`] - Request logging
//! - [`request_log`] - The logging middleware and outcome classification
//! - [`request`] - Request ID generation and propagation
//! - [`features`] - Timeouts and health probes
//! - [`control`] - Panic catching
//! - [`builder`] - Orchestration (setup_middleware, start, router delegation)

mod builder;
mod control;
mod features;
mod observability;
mod request;
mod request_log;
mod router;

pub use request_log::{Outcome, severity};
pub use router::FluentRouter;

#[cfg(test)]
mod tests;
