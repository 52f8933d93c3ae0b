//! Test data builders for creating test objects

use acrl_rs::config::{AppConfig, AppPaths, INPUT_FILENAME};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tempfile::TempDir;

/// Builder for test configs that stay off the default ports
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    /// Telemetry to an unused port, command endpoint on an ephemeral port
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.telemetry.port = super::free_udp_port();
        config.input.port = 0;
        config.logging.file = false;
        Self { config }
    }

    pub fn telemetry_port(mut self, port: u16) -> Self {
        self.config.telemetry.port = port;
        self
    }

    pub fn input_port(mut self, port: u16) -> Self {
        self.config.input.port = port;
        self
    }

    pub fn telemetry_enabled(mut self, enabled: bool) -> Self {
        self.config.telemetry.enabled = enabled;
        self
    }

    pub fn input_enabled(mut self, enabled: bool) -> Self {
        self.config.input.enabled = enabled;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

/// Temporary documents and application directories
pub struct TestDirs {
    pub documents: TempDir,
    pub app: TempDir,
}

impl TestDirs {
    pub fn new() -> Self {
        Self {
            documents: tempfile::tempdir().expect("documents dir"),
            app: tempfile::tempdir().expect("app dir"),
        }
    }

    pub fn paths(&self) -> AppPaths {
        AppPaths::new(Some(self.documents.path().to_path_buf()), self.app.path())
    }

    pub fn input_file(&self) -> PathBuf {
        self.documents.path().join(INPUT_FILENAME)
    }
}

/// Builder for command JSON documents
#[derive(Default)]
pub struct CommandBuilder {
    fields: Map<String, Value>,
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&self.fields).expect("serializable command")
    }

    /// Write the document to `path`
    pub fn write_to(&self, path: &std::path::Path) {
        std::fs::write(path, self.to_bytes()).expect("writable command file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let bytes = CommandBuilder::new().set("reset", true).to_bytes();
        assert_eq!(bytes, br#"{"reset":true}"#);
    }
}
