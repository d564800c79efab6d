//! The error types for this crate.
//!
//! Most functions return [`Result<T>`] which uses [`EmotionError`] as the error type.
//! Per-call prediction failures are [`PredictError`] values and travel inside
//! [`PredictionResult`](crate::PredictionResult) instead of aborting the caller.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while loading model artifacts.
///
/// Any of these is fatal: a pipeline is never built around a partially loaded model.
#[derive(Error, Debug, Clone, Serialize)]
#[non_exhaustive]
pub enum ArtifactError {
    /// A required artifact file does not exist.
    #[error("Missing model artifact '{path}'")]
    Missing {
        /// The path that was expected to hold the artifact.
        path: String,
    },

    /// An artifact file exists but could not be read.
    #[error("Failed to read model artifact '{path}': {reason}")]
    Read {
        /// The path of the unreadable artifact.
        path: String,
        /// The reason reading failed.
        reason: String,
    },

    /// An artifact file is not valid for its format.
    #[error("Failed to parse model artifact '{path}': {reason}")]
    Parse {
        /// The path of the malformed artifact.
        path: String,
        /// The reason parsing failed.
        reason: String,
    },

    /// Artifacts parsed but are inconsistent with each other.
    #[error("Invalid {artifact}: {reason}")]
    Invalid {
        /// Which artifact failed validation (e.g. "classifier").
        artifact: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl ArtifactError {
    pub(crate) fn invalid(artifact: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            artifact: artifact.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors produced by a single prediction.
///
/// These never abort a batch or a conversation; they are reported per item.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub enum PredictError {
    /// Normalization left nothing to classify.
    #[error("Text is empty after preprocessing")]
    EmptyAfterPreprocessing,

    /// Feature extraction or inference failed.
    #[error("{0}")]
    Inference(String),
}

/// Errors raised when a request is rejected before the pipeline runs.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub enum ValidationError {
    /// The request carried no body.
    #[error("No data provided")]
    NoData,

    /// The `text` field is missing or blank.
    #[error("Text is required")]
    TextRequired,

    /// The `text` field is longer than allowed.
    #[error("Text exceeds maximum length of {max} characters")]
    TextTooLong {
        /// Maximum number of characters accepted.
        max: usize,
    },

    /// The `texts` field is missing.
    #[error("Texts array is required")]
    TextsRequired,

    /// The `texts` field is not an array.
    #[error("Texts must be an array")]
    TextsNotArray,

    /// The batch holds more texts than allowed.
    #[error("Maximum {max} texts allowed per batch")]
    BatchTooLarge {
        /// Maximum batch size.
        max: usize,
        /// Size of the rejected batch.
        actual: usize,
    },

    /// The `messages` field is missing.
    #[error("Messages array is required")]
    MessagesRequired,

    /// The `messages` field is not an array.
    #[error("Messages must be an array")]
    MessagesNotArray,
}

impl ValidationError {
    /// Client-facing category for the transport layer.
    pub fn category(&self) -> &'static str {
        "bad_request"
    }
}

/// The unified error type for all crate errors.
///
/// Wraps the domain errors above and errors from external crates (Candle, IO, JSON,
/// TOML). Use `?` to propagate or match on variants for granular handling.
#[derive(Error, Debug, Serialize)]
#[non_exhaustive]
pub enum EmotionError {
    /// Errors that can occur while loading model artifacts.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Errors produced by a single prediction.
    #[error(transparent)]
    Predict(#[from] PredictError),

    /// Errors raised when a request is rejected before the pipeline runs.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Failed to initialize the requested device.
    #[error("Failed to init CUDA device {index}: {reason}. Try DeviceRequest::Cpu as fallback.")]
    Device {
        /// The index of the CUDA device that failed to initialize.
        index: usize,
        /// The reason why the device failed to initialize.
        reason: String,
    },

    /// Errors that can occur when using Candle.
    #[error("Candle error: {0}")]
    Candle(String),

    /// Errors that can occur when using IO.
    #[error("IO error: {0}")]
    Io(String),

    /// Errors that can occur when using JSON.
    #[error("JSON error: {0}")]
    SerdeJson(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A [`Result`](std::result::Result) alias using [`EmotionError`] as the error type.
pub type Result<T> = std::result::Result<T, EmotionError>;

impl From<candle_core::Error> for EmotionError {
    fn from(value: candle_core::Error) -> Self {
        EmotionError::Candle(value.to_string())
    }
}

impl From<std::io::Error> for EmotionError {
    fn from(value: std::io::Error) -> Self {
        EmotionError::Io(value.to_string())
    }
}

impl From<serde_json::Error> for EmotionError {
    fn from(value: serde_json::Error) -> Self {
        EmotionError::SerdeJson(value.to_string())
    }
}

impl From<toml::de::Error> for EmotionError {
    fn from(value: toml::de::Error) -> Self {
        EmotionError::Config(value.to_string())
    }
}

impl From<EmotionError> for PredictError {
    fn from(value: EmotionError) -> Self {
        match value {
            EmotionError::Predict(err) => err,
            other => PredictError::Inference(other.to_string()),
        }
    }
}
