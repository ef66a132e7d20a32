//! In-memory log capture for unit tests.

use {
    super::logger::Logger,
    crate::{LogFormat, LoggingConfig},
    std::{
        io,
        sync::{Arc, Mutex},
    },
    tracing_subscriber::fmt::MakeWriter,
};

/// Shared buffer collecting every line written by the loggers it creates.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// A JSON logger writing into this buffer. `app_name` defaults to `test-app`.
    pub(crate) fn logger(&self, config: LoggingConfig) -> Logger {
        let config = LoggingConfig {
            app_name: config.app_name.clone().or_else(|| Some("test-app".into())),
            format: LogFormat::Json,
            ..config
        };
        Logger::with_writer(config, self.clone()).unwrap()
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub(crate) fn json_lines(&self) -> Vec<serde_json::Value> {
        self.contents()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

pub(crate) struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(Arc::clone(&self.0))
    }
}
