//! The structured logger.

use {
    super::{
        fields::{FieldError, FieldSet},
        sink::Sink,
    },
    crate::{Error, LogFormat, LoggingConfig, Result},
    serde_json::Value,
    std::{
        fmt,
        panic::Location,
        sync::{Arc, OnceLock},
    },
    tracing::{Dispatch, Level},
    tracing_appender::non_blocking::WorkerGuard,
    tracing_subscriber::{
        EnvFilter, Layer, Registry,
        fmt::{MakeWriter, writer::BoxMakeWriter},
        layer::SubscriberExt,
    },
};

/// Field added by [`Logger::with`] when `caller_info` is enabled.
pub const CALLER_FIELD: &str = "caller";

static DEFAULT_LOGGER: OnceLock<Logger> = OnceLock::new();

struct LoggerCore {
    config: LoggingConfig,
    dispatch: Dispatch,
    // flushes the file sink's worker when the last logger goes away
    _guard: Option<WorkerGuard>,
}

/// A structured logger carrying a set of fields.
///
/// Cloning is cheap: the sink and configuration are shared, and the fields
/// are reference counted. [`Logger::with`] never mutates the receiver; it
/// returns a new logger whose fields are the receiver's plus the new ones.
///
/// Every line goes through the logger's own `tracing` dispatch, so two
/// loggers with different sinks can be used side by side.
///
/// ```
/// use webframe::{Logger, LoggingConfig, fields};
///
/// let root = Logger::console(LoggingConfig::default());
/// let request = root.with(fields!("path" => "/users", "method" => "GET"));
/// request.info(format_args!("loaded {} users", 3));
/// assert!(root.fields().is_empty());
/// ```
#[derive(Clone)]
pub struct Logger {
    core: Arc<LoggerCore>,
    fields: Arc<FieldSet>,
}

impl Logger {
    /// Builds a logger whose sink is picked by `config.env`: the console in
    /// development, a rotating file under `{log_dir}/{app_name}/` in production.
    pub fn new(config: LoggingConfig) -> Result<Self> {
        config.validate()?;
        let filter = config.env_filter()?;
        let sink = Sink::open(&config)?;
        Ok(Self::from_parts(config, filter, sink))
    }

    /// Builds a console logger. An unparsable level falls back to `trace`.
    pub fn console(config: LoggingConfig) -> Self {
        let filter = config
            .env_filter()
            .unwrap_or_else(|_| EnvFilter::new("trace"));
        Self::from_parts(config, filter, Sink::console())
    }

    /// Builds a logger writing to `make_writer`, ignoring `config.env`.
    pub fn with_writer<W>(config: LoggingConfig, make_writer: W) -> Result<Self>
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let filter = config.env_filter()?;
        let sink = Sink {
            writer: BoxMakeWriter::new(make_writer),
            guard: None,
            ansi: false,
        };
        Ok(Self::from_parts(config, filter, sink))
    }

    fn from_parts(config: LoggingConfig, filter: EnvFilter, sink: Sink) -> Self {
        let Sink {
            writer,
            guard,
            ansi,
        } = sink;

        let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .boxed(),
            LogFormat::Default => tracing_subscriber::fmt::layer()
                .with_ansi(ansi)
                .with_writer(writer)
                .boxed(),
            LogFormat::Compact => tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(ansi)
                .with_writer(writer)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_ansi(ansi)
                .with_writer(writer)
                .boxed(),
        };
        let dispatch = Dispatch::new(Registry::default().with(layer).with(filter));

        Logger {
            core: Arc::new(LoggerCore {
                config,
                dispatch,
                _guard: guard,
            }),
            fields: Arc::new(FieldSet::new()),
        }
    }

    /// Returns a logger carrying the receiver's fields plus `fields`; on a
    /// key conflict the new value wins. With `caller_info` enabled the call
    /// site is recorded in the `caller` field as `file:line`, for example
    /// `src/orders.rs:42`. Rust call-site locations carry no function name,
    /// so the source file stands in for it.
    #[track_caller]
    #[must_use]
    pub fn with(&self, fields: FieldSet) -> Logger {
        let mut merged = self.fields.merge(&fields);
        if self.core.config.caller_info {
            let location = Location::caller();
            merged.insert(
                CALLER_FIELD,
                format!("{}:{}", location.file(), location.line()),
            );
        }
        Logger {
            core: Arc::clone(&self.core),
            fields: Arc::new(merged),
        }
    }

    /// Like [`Logger::with`] but takes an alternating `key, value, ...` list.
    #[track_caller]
    pub fn with_pairs<I>(&self, items: I) -> std::result::Result<Logger, FieldError>
    where
        I: IntoIterator<Item = Value>,
    {
        Ok(self.with(FieldSet::from_pairs(items)?))
    }

    pub fn fields(&self) -> &FieldSet {
        &self.fields
    }

    pub fn config(&self) -> &LoggingConfig {
        &self.core.config
    }

    /// True when both handles are the same logger (same sink and same fields).
    pub fn ptr_eq(a: &Logger, b: &Logger) -> bool {
        Arc::ptr_eq(&a.core, &b.core) && Arc::ptr_eq(&a.fields, &b.fields)
    }

    /// True when both handles write to the same sink.
    pub fn same_sink(a: &Logger, b: &Logger) -> bool {
        Arc::ptr_eq(&a.core, &b.core)
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Level::DEBUG, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::INFO, message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::WARN, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::ERROR, message);
    }

    /// Emits `message` at `level` with the logger's fields. Failures of the
    /// sink are swallowed.
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        let app = self.core.config.app_name();
        let context = &*self.fields;
        tracing::dispatcher::with_default(&self.core.dispatch, || {
            // event levels must be constants
            match level {
                Level::ERROR => tracing::error!(app = %app, context = %context, "{}", message),
                Level::WARN => tracing::warn!(app = %app, context = %context, "{}", message),
                Level::INFO => tracing::info!(app = %app, context = %context, "{}", message),
                Level::DEBUG => tracing::debug!(app = %app, context = %context, "{}", message),
                _ => tracing::trace!(app = %app, context = %context, "{}", message),
            }
        });
    }

    /// Returns the process-wide default logger, creating a console logger
    /// with default settings on first use unless [`Logger::init_global`]
    /// installed one before.
    pub fn global() -> &'static Logger {
        DEFAULT_LOGGER.get_or_init(|| Logger::console(LoggingConfig::default()))
    }

    /// Installs `logger` as the process-wide default and as the global
    /// `tracing` dispatcher, so framework events reach the same sink.
    ///
    /// Fails if a default logger already exists, including one created
    /// lazily by [`Logger::global`].
    pub fn init_global(logger: Logger) -> Result<()> {
        let dispatch = logger.core.dispatch.clone();
        DEFAULT_LOGGER
            .set(logger)
            .map_err(|_| Error::config("a default logger has already been initialized"))?;

        if tracing::dispatcher::set_global_default(dispatch).is_err() {
            // another subscriber owns the global slot; our own lines are unaffected
            Self::global().warn("global tracing subscriber already set, framework events go elsewhere");
        }
        Ok(())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("env", &self.core.config.env)
            .field("format", &self.core.config.format)
            .field("fields", &*self.fields)
            .finish()
    }
}
