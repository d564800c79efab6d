use std::sync::Arc;

use super::{build_cache_key, DeviceRequest, DeviceSelectable};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::pipelines::cache::{global_cache, ModelOptions};

pub trait BasePipelineBuilder<M>: DeviceSelectable + Sized
where
    M: Send + Sync + 'static,
{
    type Pipeline;

    type Options: ModelOptions + Clone;

    fn options(&self) -> &Self::Options;

    fn device_request(&self) -> &DeviceRequest;

    fn config(&self) -> &PipelineConfig;

    fn create_model(options: Self::Options, device: candle_core::Device) -> Result<M>;

    fn construct_pipeline(model: Arc<M>, config: PipelineConfig) -> Result<Self::Pipeline>;

    fn build(self) -> Result<Self::Pipeline> {
        let device = self.device_request().clone().resolve()?;

        let key = build_cache_key(self.options(), &device);

        let model = global_cache().get_or_create(&key, || {
            Self::create_model(self.options().clone(), device.clone())
        })?;

        Self::construct_pipeline(model, self.config().clone())
    }
}

pub struct StandardPipelineBuilder<Opts> {
    pub(crate) options: Opts,
    pub(crate) device_request: DeviceRequest,
    pub(crate) config: PipelineConfig,
}

impl<Opts> StandardPipelineBuilder<Opts> {
    pub fn new(options: Opts) -> Self {
        Self {
            options,
            device_request: DeviceRequest::Cpu,
            config: PipelineConfig::default(),
        }
    }
}

impl<Opts> DeviceSelectable for StandardPipelineBuilder<Opts> {
    fn device_request_mut(&mut self) -> &mut DeviceRequest {
        &mut self.device_request
    }
}
