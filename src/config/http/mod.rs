mod middleware;

pub use middleware::*;

use {
    crate::{Error, Result},
    serde::Deserialize,
    std::time::Duration,
};

///
/// Configuration for the HTTP server
///
/// Controls the listening address, the request timeout, the health routes
/// and which of the standard middlewares `setup_middleware()` installs.
///
/// ```toml
/// [http]
/// bind_addr = "0.0.0.0"
/// bind_port = 8080
/// request_timeout = "10m"
/// Exclude = ["timeout"]
/// ```
///
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// IP address to bind the HTTP server to
    /// The default `bind_addr` is "127.0.0.1".
    #[serde(default = "HttpConfig::default_bind_addr")]
    pub bind_addr: String,

    /// Port to bind the HTTP server to
    /// The default `bind_port` is 8080.
    #[serde(default = "HttpConfig::default_bind_port")]
    pub bind_port: u16,

    /// Maximum allowed time for a request to complete before timing out.
    /// If a request takes longer than this it will be aborted with a 408
    /// Request Timeout response. By default `request_timeout` is None.
    #[serde(default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,

    /// Route for liveness checks.
    /// By default `liveness` is "/live".
    #[serde(default = "HttpConfig::default_liveness_route")]
    pub liveness_route: String,

    /// Route for readiness checks. Under the `postgres` feature the route
    /// pings the database and answers 503 when it is unreachable.
    /// By default `readiness` is set to "/ready".
    #[serde(default = "HttpConfig::default_readiness_route")]
    pub readiness_route: String,

    /// Maximum time to wait for graceful shutdown to complete.
    /// After this timeout, the server will force shutdown.
    /// By default `shutdown_timeout` is set to 30 seconds.
    #[serde(
        default = "HttpConfig::default_shutdown_timeout",
        with = "humantime_serde"
    )]
    pub shutdown_timeout: Duration,

    #[serde(flatten)]
    pub middleware: Option<HttpMiddlewareConfig>,
}

impl HttpConfig {
    ///
    /// Returns the full bind address as a string in the format "IP:PORT".
    ///
    pub fn full_bind_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.bind_port)
    }

    fn default_bind_addr() -> String {
        "127.0.0.1".into()
    }

    fn default_bind_port() -> u16 {
        8080
    }

    fn default_liveness_route() -> String {
        "/live".into()
    }

    fn default_readiness_route() -> String {
        "/ready".into()
    }

    fn default_shutdown_timeout() -> Duration {
        Duration::from_secs(30)
    }

    pub fn validate(&self) -> Result<()> {
        // Validate bind address
        if self.bind_addr.trim().is_empty() {
            return Err(Error::invalid_input(
                "HTTP bind_addr is required. Set [http] bind_addr = \"0.0.0.0\" or \"127.0.0.1\" in config.",
            ));
        }

        // Validate bind address format (basic IP address validation)
        if self.bind_addr.parse::<std::net::IpAddr>().is_err() {
            return Err(Error::invalid_input(
                "HTTP bind_addr must be a valid IP address. Examples: \"127.0.0.1\", \"0.0.0.0\", \"::1\"",
            ));
        }

        for (name, route) in [
            ("liveness_route", &self.liveness_route),
            ("readiness_route", &self.readiness_route),
        ] {
            if !route.starts_with('/') {
                return Err(Error::invalid_input(format!(
                    "HTTP {name} must start with '/', got \"{route}\""
                )));
            }
        }

        if self.liveness_route == self.readiness_route {
            return Err(Error::invalid_input(
                "HTTP liveness_route and readiness_route must differ",
            ));
        }

        Ok(())
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            bind_addr: Self::default_bind_addr(),
            bind_port: Self::default_bind_port(),
            request_timeout: None,
            liveness_route: Self::default_liveness_route(),
            readiness_route: Self::default_readiness_route(),
            shutdown_timeout: Self::default_shutdown_timeout(),
            middleware: None,
        }
    }
}
