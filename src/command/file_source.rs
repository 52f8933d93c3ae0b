//! The persisted command file
//!
//! The file is read again on every tick. It is looked up in the documents
//! directory first and the application directory second. A missing file is
//! not an error; a file that cannot be read or parsed is logged and ignored
//! for that tick.

use super::message::CommandMessage;
use crate::config::AppPaths;
use std::path::PathBuf;

/// A command read from disk, with the file it came from
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    pub message: CommandMessage,
    pub path: PathBuf,
}

/// Reads the command file from the resolved locations
#[derive(Debug, Clone)]
pub struct FileCommandSource {
    paths: AppPaths,
}

impl FileCommandSource {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Read and decode the command file, if there is a usable one
    pub fn read_pending(&self) -> Option<PendingCommand> {
        let path = self.paths.locate_input_file()?;

        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Error reading input file {:?}: {}", path, e);
                return None;
            }
        };

        match CommandMessage::from_slice(&bytes) {
            Ok(message) => Some(PendingCommand { message, path }),
            Err(e) => {
                tracing::warn!("Error parsing input file {:?}: {}", path, e);
                None
            }
        }
    }
}
