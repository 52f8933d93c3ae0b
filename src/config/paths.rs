//! Resolution of the well-known file locations
//!
//! The telemetry fallback file and the command file live in the host's
//! "documents" directory when one is available, and in the application
//! directory otherwise. The diagnostic log always lives in the application
//! directory.

use super::{PathsConfig, DEBUG_LOG_FILENAME, INPUT_FILENAME, TELEMETRY_FILENAME};
use std::path::{Path, PathBuf};

/// Resolved directories used by the publisher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    documents_dir: Option<PathBuf>,
    app_dir: PathBuf,
}

impl AppPaths {
    /// Create from explicit directories
    pub fn new(documents_dir: Option<PathBuf>, app_dir: impl Into<PathBuf>) -> Self {
        Self {
            documents_dir,
            app_dir: app_dir.into(),
        }
    }

    /// Resolve directories from config overrides and the platform
    pub fn resolve(config: &PathsConfig) -> Self {
        let documents_dir = config
            .documents_dir
            .clone()
            .or_else(dirs_next::document_dir)
            .filter(|dir| dir.is_dir());

        let app_dir = config
            .app_dir
            .clone()
            .or_else(executable_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            documents_dir,
            app_dir,
        }
    }

    /// Host documents directory, if available
    pub fn documents_dir(&self) -> Option<&Path> {
        self.documents_dir.as_deref()
    }

    /// Application directory
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Directory preferred for the telemetry and command files
    pub fn data_dir(&self) -> &Path {
        self.documents_dir.as_deref().unwrap_or(&self.app_dir)
    }

    /// Destination of the telemetry fallback file
    pub fn telemetry_file(&self) -> PathBuf {
        self.data_dir().join(TELEMETRY_FILENAME)
    }

    /// Preferred location of the command file
    pub fn input_file(&self) -> PathBuf {
        self.data_dir().join(INPUT_FILENAME)
    }

    /// Existing command file, checking the documents directory first
    pub fn locate_input_file(&self) -> Option<PathBuf> {
        let preferred = self.input_file();
        if preferred.is_file() {
            return Some(preferred);
        }

        let fallback = self.app_dir.join(INPUT_FILENAME);
        fallback.is_file().then_some(fallback)
    }

    /// Location of the append-only diagnostic log
    pub fn debug_log_file(&self) -> PathBuf {
        self.app_dir.join(DEBUG_LOG_FILENAME)
    }
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
