//! Destinations for log lines: the console and a size-rotated file.

use {
    crate::{LoggingConfig, Result, RunMode},
    file_rotate::{
        ContentLimit, FileRotate,
        compression::Compression,
        suffix::{AppendTimestamp, FileLimit},
    },
    std::{
        fs,
        io::{self, Write},
        path::{Path, PathBuf},
        time::{Duration, Instant, SystemTime},
    },
    tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard},
    tracing_subscriber::fmt::writer::BoxMakeWriter,
};

/// How often the file sink looks for expired backups.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// File name of the active log file inside the application's log directory.
pub const LOG_FILE_NAME: &str = "log";

/// A writer plus whatever keeps it alive.
pub(crate) struct Sink {
    pub(crate) writer: BoxMakeWriter,
    pub(crate) guard: Option<WorkerGuard>,
    pub(crate) ansi: bool,
}

impl Sink {
    /// Picks the sink for the configured run mode.
    pub(crate) fn open(config: &LoggingConfig) -> Result<Self> {
        match config.env {
            RunMode::Production => Self::rotating_file(config),
            RunMode::Development => Ok(Self::console()),
        }
    }

    pub(crate) fn console() -> Self {
        Sink {
            writer: BoxMakeWriter::new(io::stdout),
            guard: None,
            ansi: true,
        }
    }

    /// Opens the rotating file behind a lossy non-blocking writer. Lines are
    /// dropped rather than blocking the caller when the worker falls behind.
    fn rotating_file(config: &LoggingConfig) -> Result<Self> {
        let file = RotatingFile::open(
            &config.log_file_dir(),
            config.max_file_bytes(),
            config.max_backups,
            config.max_age(),
        )?;
        let (writer, guard) = NonBlockingBuilder::default()
            .lossy(true)
            .thread_name("webframe-log-writer")
            .finish(file);
        Ok(Sink {
            writer: BoxMakeWriter::new(writer),
            guard: Some(guard),
            ansi: false,
        })
    }
}

/// A log file rotated by size, with backups capped by count and by age.
///
/// Backups carry a local timestamp suffix (`log.20240101T120000`). Count
/// limits are enforced by `file-rotate` on every rotation; expired backups
/// are removed on open and then at most once per minute while writing.
///
/// `file-rotate` remembers the backups it has seen and deletes the oldest on
/// rotation, so after pruning the handle is reopened to rescan the directory.
pub struct RotatingFile {
    inner: FileRotate<AppendTimestamp>,
    path: PathBuf,
    max_bytes: usize,
    max_backups: usize,
    max_age: Duration,
    last_prune: Instant,
}

impl RotatingFile {
    /// Opens (or creates) `{dir}/log`, creating `dir` when missing.
    pub fn open(dir: &Path, max_bytes: usize, max_backups: usize, max_age: Duration) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILE_NAME);
        let mut file = RotatingFile {
            inner: Self::rotate_handle(&path, max_bytes, max_backups),
            path,
            max_bytes,
            max_backups,
            max_age,
            last_prune: Instant::now(),
        };
        file.prune_expired()?;
        Ok(file)
    }

    fn rotate_handle(path: &Path, max_bytes: usize, max_backups: usize) -> FileRotate<AppendTimestamp> {
        FileRotate::new(
            path,
            AppendTimestamp::default(FileLimit::MaxFiles(max_backups)),
            ContentLimit::BytesSurpassed(max_bytes),
            Compression::None,
            None,
        )
    }

    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rotated files, oldest first.
    pub fn backups(&mut self) -> Vec<PathBuf> {
        self.inner.log_paths()
    }

    /// Removes backups whose modification time is older than the maximum age
    /// and returns how many were removed.
    pub fn prune_expired(&mut self) -> io::Result<usize> {
        self.last_prune = Instant::now();
        let now = SystemTime::now();
        let mut removed = 0;
        for backup in self.inner.log_paths() {
            let expired = fs::metadata(&backup)
                .and_then(|meta| meta.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > self.max_age);
            if !expired {
                continue;
            }
            match fs::remove_file(&backup) {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => removed += 1,
                // the logger cannot log about itself
                Err(err) => eprintln!("failed to remove expired log file {}: {err}", backup.display()),
            }
        }

        if removed > 0 {
            self.inner.flush()?;
            self.inner = Self::rotate_handle(&self.path, self.max_bytes, self.max_backups);
        }
        Ok(removed)
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        if self.last_prune.elapsed() >= PRUNE_INTERVAL {
            // pruning is housekeeping; the line is already written
            let _ = self.prune_expired();
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
