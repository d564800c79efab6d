//! On-disk layout of a trained emotion model.
//!
//! A model directory holds three co-versioned JSON files:
//!
//! - `vectorizer.json`: the TF-IDF feature transformer
//! - `classifier.json`: the linear classifier over those features
//! - `model_info.json`: the model's declared identity

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::pipelines::cache::ModelOptions;

pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const MODEL_INFO_FILE: &str = "model_info.json";

/// Declared identity of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Paths of the three artifact files inside a model directory.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub vectorizer: PathBuf,
    pub classifier: PathBuf,
    pub model_info: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            vectorizer: dir.join(VECTORIZER_FILE),
            classifier: dir.join(CLASSIFIER_FILE),
            model_info: dir.join(MODEL_INFO_FILE),
        }
    }
}

/// Where to load a model from. Used as the model's build options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOptions {
    pub dir: PathBuf,
}

impl ArtifactOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.dir)
    }
}

impl ModelOptions for ArtifactOptions {
    fn cache_key(&self) -> String {
        // Two spellings of one directory must share a cache slot.
        let dir = fs::canonicalize(&self.dir).unwrap_or_else(|_| self.dir.clone());
        format!("artifacts:{}", dir.display())
    }
}

/// Read and deserialize one JSON artifact.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let display = path.display().to_string();
    if !path.is_file() {
        return Err(ArtifactError::Missing { path: display });
    }

    let data = fs::read_to_string(path).map_err(|e| ArtifactError::Read {
        path: display.clone(),
        reason: e.to_string(),
    })?;

    serde_json::from_str(&data).map_err(|e| ArtifactError::Parse {
        path: display,
        reason: e.to_string(),
    })
}

pub(crate) fn load_model_info(path: &Path) -> Result<ModelInfo, ArtifactError> {
    let info: ModelInfo = read_json(path)?;
    if info.model_name.trim().is_empty() {
        return Err(ArtifactError::invalid("model info", "model_name is empty"));
    }
    Ok(info)
}
