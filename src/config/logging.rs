use {
    crate::{Error, Result},
    serde::Deserialize,
    std::{convert::Infallible, fmt, path::PathBuf, str::FromStr, time::Duration},
    tracing_subscriber::EnvFilter,
};

///
/// Configuration for the structured logger.
///
/// In development the logger writes to the console. In production it writes
/// to `{log_dir}/{app_name}/log`, rotating the file once it surpasses
/// `max_file_mb` and pruning backups by count and by age.
///
/// ```toml
/// [logging]
/// app_name = "orders"
/// env = "{{ RUN_MODE }}"
/// format = "json"
/// level = "info,tower_http=warn"
/// ```
///
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Application name, used as the log directory name. Defaults to the
    /// executable's file stem.
    #[serde(default)]
    pub app_name: Option<String>,

    /// Run mode selecting the sink. `"production"` or `"prod"` (any case)
    /// selects the rotating file, everything else the console.
    #[serde(default)]
    pub env: RunMode,

    /// Format for log output.
    /// The default format is `default`, which is "full" human-readable format.
    /// Other options are `json`, `compact`, and `pretty`.
    #[serde(default)]
    pub format: LogFormat,

    /// Level filter in `EnvFilter` syntax. By default `level` is "trace".
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Root directory for log files. By default `log_dir` is "logs".
    #[serde(default = "LoggingConfig::default_log_dir")]
    pub log_dir: PathBuf,

    /// Size in MiB after which the log file is rotated. Defaults to 10.
    #[serde(default = "LoggingConfig::default_max_file_mb")]
    pub max_file_mb: u64,

    /// Rotated files older than this many days are removed. Defaults to 10.
    #[serde(default = "LoggingConfig::default_max_age_days")]
    pub max_age_days: u64,

    /// Number of rotated files kept. Defaults to 10.
    #[serde(default = "LoggingConfig::default_max_backups")]
    pub max_backups: usize,

    /// Adds a `caller` field with the `file:line` that enriched the logger.
    #[serde(default)]
    pub caller_info: bool,

    /// Logs bad-request outcomes at warn instead of error.
    #[serde(default)]
    pub client_errors_as_warn: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "trace".into()
    }

    fn default_log_dir() -> PathBuf {
        PathBuf::from("logs")
    }

    fn default_max_file_mb() -> u64 {
        10
    }

    fn default_max_age_days() -> u64 {
        10
    }

    fn default_max_backups() -> usize {
        10
    }

    /// Returns the configured application name or the executable's file stem.
    pub fn app_name(&self) -> String {
        if let Some(name) = &self.app_name {
            return name.clone();
        }
        std::env::args_os()
            .next()
            .map(PathBuf::from)
            .and_then(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
    }

    /// Directory holding the active log file and its backups.
    pub fn log_file_dir(&self) -> PathBuf {
        self.log_dir.join(self.app_name())
    }

    /// Maximum age of a rotated file.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_days * 24 * 60 * 60)
    }

    /// Rotation threshold in bytes.
    pub fn max_file_bytes(&self) -> usize {
        usize::try_from(self.max_file_mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }

    /// Parses `level` into a filter.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        Ok(EnvFilter::try_new(&self.level)?)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.app_name
            && (name.trim().is_empty() || name.contains(['/', '\\']))
        {
            return Err(Error::config(
                "[logging] app_name must be a non-empty directory name without path separators",
            ));
        }

        if self.max_file_mb == 0 {
            return Err(Error::config("[logging] max_file_mb must be > 0"));
        }

        if self.max_backups == 0 {
            return Err(Error::config("[logging] max_backups must be > 0"));
        }

        self.env_filter()?;
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            app_name: None,
            env: RunMode::default(),
            format: LogFormat::default(),
            level: Self::default_level(),
            log_dir: Self::default_log_dir(),
            max_file_mb: Self::default_max_file_mb(),
            max_age_days: Self::default_max_age_days(),
            max_backups: Self::default_max_backups(),
            caller_info: false,
            client_errors_as_warn: false,
        }
    }
}

/// Run mode deciding where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

impl FromStr for RunMode {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(RunMode::Production),
            _ => Ok(RunMode::Development),
        }
    }
}

impl From<String> for RunMode {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(mode) => mode,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Development => f.write_str("development"),
            RunMode::Production => f.write_str("production"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Default,
    Compact,
    Pretty,
}
