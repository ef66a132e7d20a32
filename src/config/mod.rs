//!
//! Configuration structures and utilities for wiring up the application or service.
//!
//! A configuration can be created in many ways:
//! - From an environment-specific TOML file via `Config::from_rust_env` or `Config::from_toml_file`
//! - From a TOML string via `Config::from_toml`
//! - Constructed programmatically via the builder methods on `Config`
//!
//! In both TOML-based methods, environment variables can be referenced in the TOML
//! using the {{ VAR_NAME }} syntax, and they will be substituted with the corresponding
//! environment variable value. This keeps secrets and deployment-specific values such
//! as the run mode (`env = "{{ RUN_MODE }}"`) out of the TOML files.
//!
//! Configuration is split into logical sections, each represented by their own struct:
//!
//! - `HttpConfig` for HTTP server settings
//! - `LoggingConfig` for the structured logger and its sinks
//! - `DatabaseConfig` for the optional Postgres handle (`postgres` feature)
//!
mod http;
mod logging;

#[cfg(feature = "postgres")]
mod database;
#[cfg(feature = "postgres")]
pub use database::*;

pub use http::*;
pub use logging::*;

#[cfg(feature = "postgres")]
use sqlx_postgres::{
    PgConnectOptions as PoolConnectOptions, PgPool as Pool, PgPoolOptions as PoolOptions,
};

use {
    crate::{Error, Logger, Result, utils::replace_handlebars_with_env},
    serde::Deserialize,
    std::{env, fs, path::PathBuf, str::FromStr, time::Duration},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[cfg(feature = "postgres")]
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    ///
    /// Creates a default configuration.
    /// This will attempt to load configuration from the file based on the RUST_ENV
    /// environment variable falling back to a default configuration if the environment
    /// variable is not set. Configuration files should be located in the "config/"
    /// directory of your project.
    ///
    fn default() -> Self {
        match Self::from_rust_env() {
            Ok(config) => config,
            Err(_) => Config {
                http: HttpConfig::default(),
                #[cfg(feature = "postgres")]
                database: DatabaseConfig::default(),
                logging: LoggingConfig::default(),
            },
        }
    }
}

impl Config {
    ///
    /// Loads the configuration from a file based on the RUST_ENV environment variable.
    /// Fails when RUST_ENV is not set.
    ///
    pub fn from_rust_env() -> Result<Config> {
        Self::from_toml_file(env::var("RUST_ENV")?)
    }

    ///
    /// Given an environment name, loads the corresponding configuration file,
    /// substitutes any environment variables, and returns a Config struct.
    /// The configuration file is expected to be located at "config/{env}.toml"
    /// where {env} is the provided environment name (e.g., "dev", "prod").
    ///
    pub fn from_toml_file(env: impl AsRef<str>) -> Result<Config> {
        let path = format!("config/{}.toml", env.as_ref());
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    ///
    /// Parses a configuration string in TOML format into a Config struct.
    ///
    pub fn from_toml(toml_str: &str) -> Result<Config> {
        toml_str.parse()
    }

    /// Sets the HTTP server bind address of the HttpConfig.
    pub fn with_bind_addr<S: AsRef<str>>(mut self, addr: S) -> Self {
        self.http.bind_addr = addr.as_ref().into();
        self
    }

    /// Sets the HTTP server bind port of the HttpConfig.
    pub fn with_bind_port(mut self, port: u16) -> Self {
        self.http.bind_port = port;
        self
    }

    /// Sets the request timeout duration of the HttpConfig.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.http.request_timeout = Some(timeout);
        self
    }

    /// Sets the liveness route path of the HttpConfig.
    pub fn with_liveness_route(mut self, route: &str) -> Self {
        self.http.liveness_route = route.into();
        self
    }

    /// Sets the readiness route path of the HttpConfig.
    pub fn with_readiness_route(mut self, route: &str) -> Self {
        self.http.readiness_route = route.into();
        self
    }

    /// Sets the graceful shutdown timeout of the HttpConfig.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.http.shutdown_timeout = timeout;
        self
    }

    /// Sets the middleware configuration of the HttpConfig.
    /// This approach activates only the specified middlewares.
    pub fn with_included_middlewares(mut self, middlewares: Vec<HttpMiddleware>) -> Self {
        self.http.middleware = Some(HttpMiddlewareConfig::Include(middlewares));
        self
    }

    /// Sets the middleware configuration of the HttpConfig.
    /// This approach activates all middlewares except the specified ones.
    pub fn with_excluded_middlewares(mut self, middlewares: Vec<HttpMiddleware>) -> Self {
        self.http.middleware = Some(HttpMiddlewareConfig::Exclude(middlewares));
        self
    }

    /// Sets the application name used for the log directory.
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.logging.app_name = Some(name.into());
        self
    }

    /// Sets the run mode selecting the log sink.
    pub fn with_run_mode(mut self, mode: RunMode) -> Self {
        self.logging.env = mode;
        self
    }

    /// Sets the log format of the LoggingConfig.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.logging.format = format;
        self
    }

    /// Sets the level filter of the LoggingConfig.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Sets the root directory for log files.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logging.log_dir = dir.into();
        self
    }

    /// Sets the rotation limits of the file sink.
    pub fn with_log_rotation(mut self, max_file_mb: u64, max_backups: usize, max_age_days: u64) -> Self {
        self.logging.max_file_mb = max_file_mb;
        self.logging.max_backups = max_backups;
        self.logging.max_age_days = max_age_days;
        self
    }

    /// Enables or disables the `caller` field.
    pub fn with_caller_info(mut self, enable: bool) -> Self {
        self.logging.caller_info = enable;
        self
    }

    /// Logs bad-request outcomes at warn instead of error.
    pub fn with_client_errors_as_warn(mut self, enable: bool) -> Self {
        self.logging.client_errors_as_warn = enable;
        self
    }

    /// Sets the Postgres database connection URL of the DatabaseConfig.
    #[cfg(feature = "postgres")]
    pub fn with_pg_url(mut self, url: &str) -> Self {
        self.database.url = url.into();
        self
    }

    /// Sets the maximum pool size of the DatabaseConfig.
    #[cfg(feature = "postgres")]
    pub fn with_pg_max_pool_size(mut self, size: u8) -> Self {
        self.database.max_pool_size = size;
        self
    }

    /// Sets the maximum idle time duration of the DatabaseConfig.
    #[cfg(feature = "postgres")]
    pub fn with_pg_max_idle_time(mut self, duration: Duration) -> Self {
        self.database.max_idle_time = Some(duration);
        self
    }

    /// Ensures that the configuration is valid.
    /// Most configuration values are either optional or have sensible defaults.
    /// Some are required and here we ensure that those required values are set.
    pub fn validate(&self) -> Result<()> {
        #[cfg(feature = "postgres")]
        self.database.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    ///
    /// Builds the root logger from the LoggingConfig and installs it as the
    /// process-wide default and as the global `tracing` subscriber.
    ///
    /// NOTE: This should be called early during startup, before anything asks
    ///       for `Logger::global()`; afterwards the default can no longer be
    ///       replaced and this returns an error.
    ///
    pub fn setup_tracing(&self) -> Result<Logger> {
        let logger = Logger::new(self.logging.clone())?;
        Logger::init_global(logger.clone())?;
        Ok(logger)
    }

    ///
    /// Builds and returns a Postgres connection pool based on the configuration.
    /// The pool connects lazily and sets the application_name to the crate
    /// package name for easier identification in the database logs.
    ///
    #[cfg(feature = "postgres")]
    pub fn create_pgpool(&self) -> Result<Pool> {
        let pool_options = PoolOptions::default()
            .min_connections(self.database.min_pool_size as u32)
            .max_connections(self.database.max_pool_size as u32)
            .idle_timeout(self.database.max_idle_time)
            .acquire_timeout(self.database.acquire_timeout);

        let connect_options = PoolConnectOptions::from_str(&self.database.url)?
            .application_name(env!("CARGO_PKG_NAME"))
            .ssl_mode(sqlx_postgres::PgSslMode::Prefer);

        Ok(pool_options.connect_lazy_with(connect_options))
    }
}

///
/// Parses a configuration string with references to environment variables
/// into a Config struct by substituting the environment variables and then
/// parsing the resulting TOML.
///
impl FromStr for Config {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let config_file = replace_handlebars_with_env(s);
        let config = toml::from_str::<Config>(&config_file)?;
        Ok(config)
    }
}
