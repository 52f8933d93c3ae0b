//! Atomic file replacement
//!
//! Both the telemetry fallback file and the command file are read by other
//! processes while this one rewrites them. Writes therefore go to a sibling
//! `<name>.tmp` file first and are moved onto the target with a single rename,
//! so a reader sees either the old document or the new one.
//!
//! ```ignore
//! use acrl_rs::storage::write_atomic;
//!
//! write_atomic(&path, br#"{"reset":false}"#)?;
//! ```

use crate::error::{Result, ResultExt};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix appended to the target filename for the staging file
pub const TMP_SUFFIX: &str = ".tmp";

/// A fully written staging file waiting to be moved onto its target
#[derive(Debug)]
#[must_use = "a staged write does nothing until committed"]
pub struct StagedWrite {
    tmp_path: PathBuf,
    target: PathBuf,
}

impl StagedWrite {
    /// Write `contents` to the staging file next to `target`
    pub fn stage(target: impl AsRef<Path>, contents: &[u8]) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let tmp_path = tmp_path_for(&target);

        let written = File::create(&tmp_path).and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        });

        if written.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        written.with_context(|| format!("Failed to stage {:?}", tmp_path))?;

        Ok(Self { tmp_path, target })
    }

    /// Path of the staging file
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    /// Move the staging file onto the target
    ///
    /// Tries an atomic replace first. If the platform refuses to replace an
    /// existing file, the target is removed and a plain rename is attempted.
    pub fn commit(self) -> Result<()> {
        if let Err(replace_err) = fs::rename(&self.tmp_path, &self.target) {
            tracing::debug!(
                "Atomic replace of {:?} failed ({}), falling back to plain rename",
                self.target,
                replace_err
            );

            let fallback = match fs::remove_file(&self.target) {
                Ok(()) => fs::rename(&self.tmp_path, &self.target),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    fs::rename(&self.tmp_path, &self.target)
                }
                Err(e) => Err(e),
            };

            if fallback.is_err() {
                let _ = fs::remove_file(&self.tmp_path);
            }
            fallback.with_context(|| format!("Failed to replace {:?}", self.target))?;
        }

        Ok(())
    }
}

/// Staging path used for `target`
pub fn tmp_path_for(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

/// Write `contents` to `target` atomically
pub fn write_atomic(target: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    StagedWrite::stage(target, contents)?.commit()
}
