//! Runtime limits and defaults for the emotion pipeline and service.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EmotionError, Result};

pub const DEFAULT_MAX_TEXT_CHARS: usize = 1000;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const DEFAULT_TOP_K: usize = 5;

/// Pipeline and service configuration.
///
/// Every field has a default, so a TOML file only needs the values it overrides:
///
/// ```toml
/// artifact_dir = "model"
/// max_batch_size = 25
/// parallel = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Directory holding the model artifacts.
    pub artifact_dir: Option<PathBuf>,
    /// Longest accepted text for a single prediction, in characters.
    pub max_text_chars: usize,
    /// Largest accepted batch.
    pub max_batch_size: usize,
    /// Number of history entries kept.
    pub history_capacity: usize,
    /// History entries returned when the caller gives no limit.
    pub default_history_limit: usize,
    /// Length of the top-probability list on each prediction.
    pub top_k: usize,
    /// Predict batch and conversation items on the rayon thread pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            artifact_dir: None,
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            default_history_limit: DEFAULT_HISTORY_LIMIT,
            top_k: DEFAULT_TOP_K,
            parallel: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_text_chars", self.max_text_chars),
            ("max_batch_size", self.max_batch_size),
            ("history_capacity", self.history_capacity),
            ("top_k", self.top_k),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(EmotionError::Config(format!("{name} must be greater than 0")));
        }
        if self.default_history_limit > self.history_capacity {
            return Err(EmotionError::Config(format!(
                "default_history_limit ({}) exceeds history_capacity ({})",
                self.default_history_limit, self.history_capacity
            )));
        }
        Ok(())
    }
}
