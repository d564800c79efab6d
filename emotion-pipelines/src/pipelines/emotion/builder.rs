use std::path::PathBuf;
use std::sync::Arc;

use super::model::EmotionClassificationModel;
use super::pipeline::EmotionPipeline;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{ArtifactOptions, TfidfLinearModel};
use crate::pipelines::cache::ModelOptions;
use crate::pipelines::utils::{
    BasePipelineBuilder, DeviceRequest, DeviceSelectable, StandardPipelineBuilder,
};

/// Builds an [`EmotionPipeline`], sharing loaded models through the global cache.
pub struct EmotionPipelineBuilder<M: EmotionClassificationModel>(
    StandardPipelineBuilder<M::Options>,
);

impl<M: EmotionClassificationModel> EmotionPipelineBuilder<M> {
    pub fn new(options: M::Options) -> Self {
        Self(StandardPipelineBuilder::new(options))
    }

    /// Limits and defaults for the built pipeline.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.0.config = config;
        self
    }

    pub fn build(self) -> Result<EmotionPipeline<M>>
    where
        M: 'static,
        M::Options: ModelOptions,
    {
        self.0.config.validate()?;
        BasePipelineBuilder::build(self)
    }
}

impl<M: EmotionClassificationModel> DeviceSelectable for EmotionPipelineBuilder<M> {
    fn device_request_mut(&mut self) -> &mut DeviceRequest {
        self.0.device_request_mut()
    }
}

impl<M> BasePipelineBuilder<M> for EmotionPipelineBuilder<M>
where
    M: EmotionClassificationModel + 'static,
    M::Options: ModelOptions,
{
    type Pipeline = EmotionPipeline<M>;
    type Options = M::Options;

    fn options(&self) -> &Self::Options {
        &self.0.options
    }

    fn device_request(&self) -> &DeviceRequest {
        &self.0.device_request
    }

    fn config(&self) -> &PipelineConfig {
        &self.0.config
    }

    fn create_model(options: Self::Options, device: candle_core::Device) -> Result<M> {
        M::new(options, device)
    }

    fn construct_pipeline(model: Arc<M>, config: PipelineConfig) -> Result<Self::Pipeline> {
        Ok(EmotionPipeline::new(model, config))
    }
}

impl EmotionPipelineBuilder<TfidfLinearModel> {
    /// Load the TF-IDF model stored in `dir`.
    pub fn from_artifacts(dir: impl Into<PathBuf>) -> Self {
        Self::new(ArtifactOptions::new(dir))
    }

    /// Load the model named by `config.artifact_dir` and keep `config` for the pipeline.
    ///
    /// Falls back to the current directory when no artifact directory is configured.
    pub fn from_config(config: PipelineConfig) -> Self {
        let dir = config
            .artifact_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_artifacts(dir).config(config)
    }
}
