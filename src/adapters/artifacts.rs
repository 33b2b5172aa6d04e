//! Artifact loader: reads the pretrained schema, scaler and classifier.
//!
//! The training pipeline exports three JSON files into one directory:
//! - `columns.json`: ordered list of expected column names
//! - `scaler.json`: fitted standardization parameters
//! - `model.json`: fitted classifier, tagged by `kind`
//!
//! # Integrity
//!
//! An optional `manifest.json` binds the artifacts by SHA-256 digest:
//!
//! ```json
//! {
//!   "version": 1,
//!   "files": { "columns.json": "<hex>", "scaler.json": "<hex>", "model.json": "<hex>" }
//! }
//! ```
//!
//! When present, every listed file must match its digest and all three
//! artifacts must be listed. A missing manifest is only fatal when
//! `require_manifest` is set.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::classifier::ClassifierArtifact;
use super::scaler::StandardScaler;
use crate::domain::{ExpectedSchema, SchemaError};
use crate::ports::{Classifier, ModelError};

/// Manifest file name inside the artifact directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

/// Error type for artifact loading.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid schema in {}: {source}", .path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("Invalid model in {}: {source}", .path.display())]
    Model {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("Invalid manifest: {0}")]
    Manifest(String),

    #[error("Digest mismatch for {0}")]
    DigestMismatch(String),
}

/// Locations of the artifact files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub columns_file: String,
    pub scaler_file: String,
    pub model_file: String,
    pub require_manifest: bool,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            columns_file: "columns.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            model_file: "model.json".to_string(),
            require_manifest: false,
        }
    }

    #[must_use]
    pub fn columns_path(&self) -> PathBuf {
        self.dir.join(&self.columns_file)
    }

    #[must_use]
    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(&self.scaler_file)
    }

    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ArtifactManifest {
    version: u32,
    files: BTreeMap<String, String>,
}

/// The three pretrained artifacts, parsed and individually validated.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub schema: ExpectedSchema,
    pub scaler: StandardScaler,
    pub classifier: ClassifierArtifact,
    /// Whether a manifest was present and verified.
    pub verified: bool,
}

/// Hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = read_bytes(path)?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn is_plain_relative(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Verify `manifest.json` if present.
///
/// Returns `Ok(false)` when there is no manifest and none is required.
///
/// # Errors
/// Returns error if the manifest is required but missing, malformed, does not
/// bind every artifact, or a digest does not match.
pub fn verify_manifest(paths: &ArtifactPaths) -> Result<bool, ArtifactError> {
    let manifest_path = paths.manifest_path();
    if !manifest_path.exists() {
        if paths.require_manifest {
            return Err(ArtifactError::Manifest(format!(
                "{} is required but missing",
                manifest_path.display()
            )));
        }
        tracing::debug!("No artifact manifest at {:?}, skipping digest check", manifest_path);
        return Ok(false);
    }

    let manifest: ArtifactManifest = read_json(&manifest_path)?;
    if manifest.version != MANIFEST_VERSION {
        return Err(ArtifactError::Manifest(format!(
            "unsupported manifest version: {}",
            manifest.version
        )));
    }

    for required in [&paths.columns_file, &paths.scaler_file, &paths.model_file] {
        if !manifest.files.contains_key(required.as_str()) {
            return Err(ArtifactError::Manifest(format!(
                "manifest does not bind {required}"
            )));
        }
    }

    for (name, expected_hex) in &manifest.files {
        if !is_plain_relative(name) {
            return Err(ArtifactError::Manifest(format!(
                "manifest entry {name:?} must be a relative path inside the artifact directory"
            )));
        }
        let bytes = read_bytes(&paths.dir.join(name))?;
        let actual_hex = sha256_hex(&bytes);
        if !constant_time_eq_str(&actual_hex, &expected_hex.to_ascii_lowercase()) {
            return Err(ArtifactError::DigestMismatch(name.clone()));
        }
    }

    tracing::info!("Artifact manifest verified ({} files)", manifest.files.len());
    Ok(true)
}

/// Load and validate all artifacts.
///
/// Cross-artifact consistency (matching widths and column names) is checked
/// when the prediction service is built.
///
/// # Errors
/// Returns error if any artifact is missing, corrupt or invalid.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<ModelArtifacts, ArtifactError> {
    tracing::info!("Loading model artifacts from {:?}", paths.dir);

    let verified = verify_manifest(paths)?;

    let columns_path = paths.columns_path();
    let columns: Vec<String> = read_json(&columns_path)?;
    let schema = ExpectedSchema::new(columns).map_err(|source| ArtifactError::Schema {
        path: columns_path,
        source,
    })?;

    let scaler_path = paths.scaler_path();
    let scaler: StandardScaler = read_json(&scaler_path)?;
    scaler.validate().map_err(|source| ArtifactError::Model {
        path: scaler_path,
        source,
    })?;

    let model_path = paths.model_path();
    let classifier: ClassifierArtifact = read_json(&model_path)?;
    classifier.validate().map_err(|source| ArtifactError::Model {
        path: model_path,
        source,
    })?;

    tracing::info!(
        "Loaded artifacts (columns={}, scaler_width={}, classifier={}, verified={})",
        schema.len(),
        scaler.mean.len(),
        classifier.kind(),
        verified
    );

    Ok(ModelArtifacts {
        schema,
        scaler,
        classifier,
        verified,
    })
}
