// ============ Internal API ============

pub(crate) mod builder;
pub(crate) mod model;
pub(crate) mod pipeline;

// ============ Public API ============

pub use crate::models::{ArtifactOptions, ModelInfo, TfidfLinearModel};
pub use builder::EmotionPipelineBuilder;
pub use model::{ClassifierOutput, EmotionClassificationModel, PredictionMode};
pub use pipeline::{
    BatchOutput, Distribution, EmotionInput, EmotionPipeline, EmotionPredictor, Output,
    Prediction, PredictionResult,
};
