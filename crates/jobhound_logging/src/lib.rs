//! Shared logging utilities for jobhound binaries.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "jobhound=info,jobhound_llm=info,jobhound_tools=info";

/// Logging configuration shared by jobhound binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Log directory; `None` means stderr only.
    pub log_dir: Option<PathBuf>,
}

/// Initialize tracing with an optional file writer and stderr output.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let file_filter = EnvFilter::try_from_env("JOBHOUND_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = if config.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("JOBHOUND_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(console_filter),
    );

    match config.log_dir {
        Some(dir) => {
            let writer = SharedFileWriter::new(dir, config.app_name)
                .context("Failed to initialize log writer")?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_filter(file_filter),
                )
                .init();
        }
        None => registry.init(),
    }

    Ok(())
}

struct AppendFile {
    file: File,
}

impl AppendFile {
    fn open(dir: PathBuf, base_name: &str) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        let path = dir.join(format!("{}.log", sanitize_name(base_name)));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        Ok(Self { file })
    }
}

#[derive(Clone)]
struct SharedFileWriter {
    inner: Arc<Mutex<AppendFile>>,
}

impl SharedFileWriter {
    fn new(dir: PathBuf, base_name: &str) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(AppendFile::open(dir, base_name)?)),
        })
    }
}

struct SharedFileWriterGuard {
    inner: Arc<Mutex<AppendFile>>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedFileWriter {
    type Writer = SharedFileWriterGuard;

    fn make_writer(&'a self) -> Self::Writer {
        SharedFileWriterGuard {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Write for SharedFileWriterGuard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        guard.file.flush()
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(sanitize_name("job/hound run"), "job_hound_run");
        assert_eq!(sanitize_name("jobhound-1"), "jobhound-1");
    }

    #[test]
    fn append_file_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs");
        let _file = AppendFile::open(nested.clone(), "test").unwrap();
        assert!(nested.join("test.log").exists());
    }
}
