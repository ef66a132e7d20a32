//! Contextual structured logging.
//!
//! - [`FieldSet`] - ordered key/value fields and the [`fields!`](crate::fields) macro
//! - [`Logger`] - immutable logger enriched with [`Logger::with`]
//! - [`Context`] - request-scoped binding of a logger and typed values
//! - [`RotatingFile`] - the production file sink

mod context;
mod fields;
mod logger;
mod sink;

#[cfg(test)]
pub(crate) mod testing;

pub use context::Context;
pub use fields::{FieldError, FieldSet};
pub use logger::{CALLER_FIELD, Logger};
pub use sink::{LOG_FILE_NAME, RotatingFile};
