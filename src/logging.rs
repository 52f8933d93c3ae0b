//! Diagnostic logging
//!
//! Events go to stderr and to the append-only `AC_RL_debug.log` in the
//! application directory. `RUST_LOG` overrides the configured filter.
//! Nothing here panics: if the log file cannot be opened, file logging is
//! switched off and a warning goes to the console instead.

use crate::config::LoggingConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Keeps the background log writer alive; flushes on drop
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    file: Option<WorkerGuard>,
}

impl LogGuard {
    /// Whether file logging is active
    pub fn file_logging(&self) -> bool {
        self.file.is_some()
    }
}

/// Install the global subscriber
///
/// Calling this again after a subscriber is installed only logs a warning.
pub fn init(config: &LoggingConfig, log_file: &Path) -> LogGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut file_error = None;
    let (file_layer, guard) = if config.file {
        match file_appender(log_file) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(false);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                file_error = Some(e);
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    let console_layer = config
        .console
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr).boxed());

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let Err(e) = installed {
        tracing::warn!("Logging already initialized: {}", e);
    }
    if let Some(e) = file_error {
        tracing::warn!("File logging disabled, cannot open {:?}: {}", log_file, e);
    }

    LogGuard { file: guard }
}

fn file_appender(log_file: &Path) -> std::io::Result<RollingFileAppender> {
    let dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = log_file
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"))?;

    std::fs::create_dir_all(dir)?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy().into_owned())
        .build(dir)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEBUG_LOG_FILENAME;

    #[test]
    fn test_file_appender_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join(DEBUG_LOG_FILENAME);
        assert!(file_appender(&path).is_ok());
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_file_appender_rejects_bare_root() {
        assert!(file_appender(Path::new("/")).is_err());
    }

    #[test]
    fn test_init_writes_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEBUG_LOG_FILENAME);
        let config = LoggingConfig {
            level: "info".to_string(),
            console: false,
            file: true,
        };

        let guard = init(&config, &path);
        assert!(guard.file_logging());
        tracing::error!("log file smoke test");
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("log file smoke test"));
    }
}
