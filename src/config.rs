//! Runtime configuration from `CARDIORISK_*` environment variables.

use std::path::PathBuf;

use crate::adapters::ArtifactPaths;

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Standard error (default; keeps stdout for the screening outcome)
    Stderr,
    Stdout,
    /// Append to `log_file`
    File,
}

impl LogMode {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("stdout") => Self::Stdout,
            Some("file") => Self::File,
            _ => Self::Stderr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub artifact_dir: PathBuf,
    pub columns_file: String,
    pub scaler_file: String,
    pub model_file: String,
    pub require_manifest: bool,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let artifact_dir = non_empty("CARDIORISK_ARTIFACT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("models"));
        let columns_file =
            non_empty("CARDIORISK_COLUMNS_FILE").unwrap_or_else(|| "columns.json".to_string());
        let scaler_file =
            non_empty("CARDIORISK_SCALER_FILE").unwrap_or_else(|| "scaler.json".to_string());
        let model_file =
            non_empty("CARDIORISK_MODEL_FILE").unwrap_or_else(|| "model.json".to_string());
        let require_manifest =
            parse_bool(lookup("CARDIORISK_REQUIRE_MANIFEST").as_deref(), false);
        let log_mode = LogMode::parse(lookup("CARDIORISK_LOG_MODE").as_deref());
        let log_file = non_empty("CARDIORISK_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("cardiorisk.log"));

        Self {
            artifact_dir,
            columns_file,
            scaler_file,
            model_file,
            require_manifest,
            log_mode,
            log_file,
        }
    }

    #[must_use]
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    #[must_use]
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            dir: self.artifact_dir.clone(),
            columns_file: self.columns_file.clone(),
            scaler_file: self.scaler_file.clone(),
            model_file: self.model_file.clone(),
            require_manifest: self.require_manifest,
        }
    }
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}
