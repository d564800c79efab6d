//! Emotion classification for short texts.
//!
//! Texts are normalized, vectorized with TF-IDF and scored by a linear classifier
//! evaluated with Candle. On top of single predictions the crate provides batches,
//! conversation summaries, a bounded prediction history and a service facade with
//! JSON envelopes for a transport layer.

// ============ Internal API ============

pub(crate) mod pipelines;

// ============ Public API ============

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod history;
pub mod labels;
pub mod models;
pub mod service;
pub mod text;

pub use pipelines::{cache, emotion, stats, utils};

pub use config::PipelineConfig;
pub use error::{EmotionError, PredictError, Result, ValidationError};
pub use labels::EmotionLabel;
pub use pipelines::emotion::{EmotionPipeline, EmotionPipelineBuilder, Prediction, PredictionResult};
pub use service::EmotionService;
