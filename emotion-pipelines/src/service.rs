//! Every operation of the emotion service behind one cloneable handle.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::api::{
    self, BatchResponse, ClearResponse, ConversationResponse, EmotionsResponse, HealthResponse,
    HistoryResponse, PredictResponse, Success,
};
use crate::config::PipelineConfig;
use crate::conversation::{ConversationAnalyzer, ConversationSummary};
use crate::error::{Result, ValidationError};
use crate::history::{HistoryEntry, HistoryLedger};
use crate::labels::{self, EmotionDescriptor, EmotionLabel};
use crate::pipelines::emotion::{EmotionClassificationModel, EmotionPipeline, PredictionResult};

/// Prediction, batch, history and conversation operations over one loaded model.
///
/// Cloning is cheap: clones share the pipeline and the history ledger.
pub struct EmotionService<M: EmotionClassificationModel> {
    pipeline: Arc<EmotionPipeline<M>>,
    history: Arc<HistoryLedger>,
}

impl<M: EmotionClassificationModel> Clone for EmotionService<M> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            history: Arc::clone(&self.history),
        }
    }
}

impl<M: EmotionClassificationModel> EmotionService<M> {
    /// Wrap a pipeline with an empty history sized from the pipeline's config.
    pub fn new(pipeline: EmotionPipeline<M>) -> Self {
        let history = HistoryLedger::new(pipeline.config().history_capacity);
        Self::with_history(pipeline, Arc::new(history))
    }

    pub fn with_history(pipeline: EmotionPipeline<M>, history: Arc<HistoryLedger>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            history,
        }
    }

    pub fn pipeline(&self) -> &EmotionPipeline<M> {
        &self.pipeline
    }

    pub fn config(&self) -> &PipelineConfig {
        self.pipeline.config()
    }

    /// Predict one text, recording it in the history on success when asked to.
    pub fn predict(&self, text: &str, save_history: bool) -> PredictionResult {
        let result = self.pipeline.predict(text);
        if let (Ok(prediction), true) = (&result, save_history) {
            self.history.record(HistoryEntry::from_prediction(prediction));
        }
        result
    }

    /// Predict every text in order. Oversized batches are rejected before any work.
    pub fn predict_batch<S: AsRef<str> + Sync>(
        &self,
        texts: &[S],
    ) -> Result<Vec<PredictionResult>> {
        Ok(self.pipeline.predict_many(texts)?.predictions)
    }

    /// Newest history entries first. `None` uses the configured default; larger limits
    /// are clamped to the ledger's capacity.
    pub fn history(&self, limit: Option<usize>) -> Vec<HistoryEntry> {
        let limit = limit
            .unwrap_or(self.config().default_history_limit)
            .min(self.history.capacity());
        self.history.list(limit)
    }

    pub fn clear_history(&self) -> ClearResponse {
        self.history.clear();
        tracing::info!("prediction history cleared");
        ClearResponse::default()
    }

    pub fn analyze_conversation(&self, messages: &[Value]) -> ConversationSummary {
        ConversationAnalyzer::new(self.pipeline.as_ref())
            .parallel(self.config().parallel)
            .analyze(messages)
    }

    /// Every known emotion with its metadata.
    pub fn emotions(&self) -> Vec<EmotionDescriptor> {
        labels::catalog()
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: api::HEALTHY,
            timestamp: Utc::now(),
            service: api::SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            model_loaded: true,
            model_type: Some(self.pipeline.model_info().model_name.clone()),
            supported_emotions: EmotionLabel::KNOWN.to_vec(),
        }
    }

    // ============ JSON entry points ============

    pub fn handle_predict(
        &self,
        body: Option<&Value>,
    ) -> std::result::Result<PredictResponse, ValidationError> {
        let request = api::validate_predict(body, self.config().max_text_chars)?;
        Ok(self.predict(&request.text, request.save_history).into())
    }

    pub fn handle_batch(
        &self,
        body: Option<&Value>,
    ) -> std::result::Result<BatchResponse, ValidationError> {
        let texts = api::validate_batch(body, self.config().max_batch_size)?;
        let output = self.pipeline.predict_unchecked(&texts);
        Ok(BatchResponse::new(output.predictions))
    }

    pub fn handle_history(&self, limit: Option<usize>) -> HistoryResponse {
        HistoryResponse::new(self.history(limit))
    }

    pub fn handle_analyze(
        &self,
        body: Option<&Value>,
    ) -> std::result::Result<ConversationResponse, ValidationError> {
        let messages = api::validate_conversation(body)?;
        Ok(Success::new(self.analyze_conversation(messages)))
    }

    pub fn handle_emotions(&self) -> EmotionsResponse {
        EmotionsResponse::new(self.emotions())
    }
}
