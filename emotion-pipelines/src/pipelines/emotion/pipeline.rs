use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::model::{ClassifierOutput, EmotionClassificationModel, PredictionMode};
use crate::config::PipelineConfig;
use crate::error::{PredictError, Result, ValidationError};
use crate::labels::{EmotionLabel, EmotionProfile};
use crate::models::ModelInfo;
use crate::pipelines::stats::PipelineStats;
use crate::text::{normalize, NormalizedText};

// ============ Output types ============

/// Outcome of predicting one text. Failures are values, never panics or aborts.
pub type PredictionResult = std::result::Result<Prediction, PredictError>;

/// Labels with percentage scores, highest first.
///
/// Serializes as a JSON object whose keys keep this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Distribution(Vec<(EmotionLabel, f64)>);

impl Distribution {
    pub fn iter(&self) -> impl Iterator<Item = &(EmotionLabel, f64)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all percentages.
    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, score)| score).sum()
    }

    pub fn get(&self, label: &EmotionLabel) -> Option<f64> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, score)| *score)
    }

    /// The first `k` entries.
    pub fn top(&self, k: usize) -> Distribution {
        Distribution(self.0.iter().take(k).cloned().collect())
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, score) in &self.0 {
            map.serialize_entry(label.as_str(), score)?;
        }
        map.end()
    }
}

/// A successful emotion prediction.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// The predicted emotion.
    pub emotion: EmotionLabel,
    /// Probability of the predicted emotion, as a percentage (0 to 100).
    pub confidence: f64,
    /// Display metadata of the predicted emotion.
    #[serde(flatten)]
    pub profile: EmotionProfile,
    /// Every class the model scored, as percentages, highest first.
    #[serde(skip)]
    pub probability_distribution: Distribution,
    /// The highest entries of `probability_distribution`.
    pub all_probabilities: Distribution,
    /// The text the classifier actually saw.
    #[serde(rename = "processed_text")]
    pub normalized_text: NormalizedText,
    /// The text as it was submitted.
    pub original_text: String,
}

/// Output from single-text `.run()`.
#[derive(Debug)]
pub struct Output {
    /// The prediction for the input text.
    pub prediction: Prediction,
    /// Execution statistics.
    pub stats: PipelineStats,
}

/// Output from batch `.run()`.
#[derive(Debug)]
pub struct BatchOutput {
    /// Predictions for each input text, in input order (may have individual failures).
    pub predictions: Vec<PredictionResult>,
    /// Execution statistics.
    pub stats: PipelineStats,
}

// ============ Input trait for type-based dispatch ============

/// Trait for emotion input that determines output type.
pub trait EmotionInput<'a> {
    /// Output type for `.run()`.
    type Output;

    #[doc(hidden)]
    fn into_texts(self) -> Vec<&'a str>;
    #[doc(hidden)]
    fn convert_output(
        predictions: Vec<PredictionResult>,
        stats: PipelineStats,
    ) -> Result<Self::Output>;
}

impl<'a> EmotionInput<'a> for &'a str {
    type Output = Output;

    fn into_texts(self) -> Vec<&'a str> {
        vec![self]
    }

    fn convert_output(
        mut predictions: Vec<PredictionResult>,
        stats: PipelineStats,
    ) -> Result<Self::Output> {
        let prediction = predictions
            .pop()
            .ok_or_else(|| PredictError::Inference("No predictions returned".into()))??;
        Ok(Output { prediction, stats })
    }
}

impl<'a> EmotionInput<'a> for &'a [&'a str] {
    type Output = BatchOutput;

    fn into_texts(self) -> Vec<&'a str> {
        self.to_vec()
    }

    fn convert_output(
        predictions: Vec<PredictionResult>,
        stats: PipelineStats,
    ) -> Result<Self::Output> {
        Ok(BatchOutput { predictions, stats })
    }
}

impl<'a, const N: usize> EmotionInput<'a> for &'a [&'a str; N] {
    type Output = BatchOutput;

    fn into_texts(self) -> Vec<&'a str> {
        self.as_slice().to_vec()
    }

    fn convert_output(
        predictions: Vec<PredictionResult>,
        stats: PipelineStats,
    ) -> Result<Self::Output> {
        Ok(BatchOutput { predictions, stats })
    }
}

// ============ Predictor seam ============

/// Anything that turns one raw text into a [`PredictionResult`].
///
/// Conversation analysis is written against this trait so it can run over any model.
pub trait EmotionPredictor: Send + Sync {
    fn predict(&self, text: &str) -> PredictionResult;

    /// Predict many texts, keeping input order.
    fn predict_all(&self, texts: &[&str], parallel: bool) -> Vec<PredictionResult> {
        if parallel {
            texts.par_iter().map(|text| self.predict(text)).collect()
        } else {
            texts.iter().map(|text| self.predict(text)).collect()
        }
    }
}

// ============ Pipeline ============

/// Pipeline for emotion classification.
///
/// Normalizes text, classifies it and shapes the scores into a [`Prediction`] with the
/// emotion's display metadata.
///
/// Use [`EmotionPipelineBuilder`](super::EmotionPipelineBuilder) to construct.
///
/// # Examples
///
/// ```rust,no_run
/// # use emotion_pipelines::emotion::EmotionPipelineBuilder;
/// # fn main() -> emotion_pipelines::error::Result<()> {
/// let pipeline = EmotionPipelineBuilder::from_artifacts("model").build()?;
///
/// // Single text - direct access
/// let output = pipeline.run("I can't stop smiling today")?;
/// println!("{} {:.2}", output.prediction.emotion, output.prediction.confidence);
///
/// // Batch - iterate results
/// let output = pipeline.run(&["Great news!", "Deadline is tomorrow and nothing works"])?;
/// for prediction in output.predictions {
///     println!("{}", prediction?.emotion);
/// }
/// # Ok(())
/// # }
/// ```
pub struct EmotionPipeline<M: EmotionClassificationModel> {
    pub(crate) model: Arc<M>,
    pub(crate) config: PipelineConfig,
}

impl<M: EmotionClassificationModel> EmotionPipeline<M> {
    pub fn new(model: Arc<M>, config: PipelineConfig) -> Self {
        Self { model, config }
    }

    /// Classify text.
    ///
    /// - Single text input returns [`Output`] with direct `.prediction` access; a
    ///   failed prediction becomes the error.
    /// - Batch input returns [`BatchOutput`] with one result per text.
    pub fn run<'a, I: EmotionInput<'a>>(&self, input: I) -> Result<I::Output> {
        let texts = input.into_texts();
        let output = self.predict_many(&texts)?;
        I::convert_output(output.predictions, output.stats)
    }

    /// Predict one text.
    pub fn predict(&self, text: &str) -> PredictionResult {
        let normalized = normalize(text);
        if normalized.is_empty() {
            tracing::debug!(chars = text.chars().count(), "nothing left after normalization");
            return Err(PredictError::EmptyAfterPreprocessing);
        }

        let output = self.classify(&normalized).inspect_err(|e| {
            tracing::warn!(error = %e, "emotion prediction failed");
        })?;

        let prediction = self.shape(output, normalized, text)?;
        tracing::debug!(
            emotion = %prediction.emotion,
            confidence = prediction.confidence,
            "emotion predicted"
        );
        Ok(prediction)
    }

    /// Predict every text, keeping input order.
    ///
    /// Batches larger than `max_batch_size` are rejected before anything is predicted.
    /// A failing item never aborts the batch.
    pub fn predict_many<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Result<BatchOutput> {
        let max = self.config.max_batch_size;
        if texts.len() > max {
            return Err(ValidationError::BatchTooLarge {
                max,
                actual: texts.len(),
            }
            .into());
        }

        Ok(self.predict_unchecked(texts))
    }

    /// [`predict_many`](Self::predict_many) for texts whose count is already checked.
    pub(crate) fn predict_unchecked<S: AsRef<str> + Sync>(&self, texts: &[S]) -> BatchOutput {
        let span = tracing::debug_span!("predict_many", items = texts.len());
        let _guard = span.enter();

        let stats = PipelineStats::start();
        let texts: Vec<&str> = texts.iter().map(AsRef::as_ref).collect();
        let predictions = self.predict_all(&texts, self.config.parallel);
        let failed = predictions.iter().filter(|p| p.is_err()).count();

        BatchOutput {
            stats: stats.finish(predictions.len(), failed),
            predictions,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model_info(&self) -> &ModelInfo {
        self.model.info()
    }

    pub fn mode(&self) -> PredictionMode {
        self.model.mode()
    }

    /// Class labels in the order the model scores them.
    pub fn labels(&self) -> &[EmotionLabel] {
        self.model.labels()
    }

    /// Returns the device (CPU/GPU) the model is running on.
    pub fn device(&self) -> &candle_core::Device {
        self.model.device()
    }

    fn classify(
        &self,
        text: &NormalizedText,
    ) -> std::result::Result<ClassifierOutput, PredictError> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.model.predict_with_scores(text))) {
            Ok(result) => result.map_err(PredictError::from),
            Err(payload) => Err(PredictError::Inference(panic_message(payload.as_ref()))),
        }
    }

    fn shape(
        &self,
        output: ClassifierOutput,
        normalized_text: NormalizedText,
        original_text: &str,
    ) -> PredictionResult {
        let ClassifierOutput {
            label,
            probabilities,
        } = output;

        let mut scored: Vec<(EmotionLabel, f32)> = probabilities;
        // Stable, so equal scores keep the model's class order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let confidence = scored
            .first()
            .map(|(_, p)| percent(*p))
            .ok_or_else(|| PredictError::Inference("Classifier returned no scores".into()))?;

        let probability_distribution = Distribution(
            scored
                .into_iter()
                .map(|(label, p)| (label, percent(p)))
                .collect(),
        );

        Ok(Prediction {
            profile: label.profile(),
            emotion: label,
            confidence,
            all_probabilities: probability_distribution.top(self.config.top_k),
            probability_distribution,
            normalized_text,
            original_text: original_text.to_string(),
        })
    }
}

impl<M: EmotionClassificationModel> EmotionPredictor for EmotionPipeline<M> {
    fn predict(&self, text: &str) -> PredictionResult {
        EmotionPipeline::predict(self, text)
    }
}

/// Probability in `[0, 1]` to a percentage rounded to two decimals.
fn percent(probability: f32) -> f64 {
    round2(f64::from(probability) * 100.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("Inference panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("Inference panicked: {message}")
    } else {
        "Inference panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmotionError;
    use crate::labels::Intensity;
    use candle_core::Device;

    struct Scripted {
        labels: Vec<EmotionLabel>,
        scores: Vec<f32>,
        mode: PredictionMode,
        info: ModelInfo,
        device: Device,
    }

    impl Scripted {
        fn new(labels: &[&str], scores: &[f32], mode: PredictionMode) -> Self {
            Self {
                labels: labels.iter().map(|l| EmotionLabel::from(*l)).collect(),
                scores: scores.to_vec(),
                mode,
                info: ModelInfo {
                    model_name: "scripted".into(),
                    version: None,
                    trained_at: None,
                    accuracy: None,
                    description: None,
                },
                device: Device::Cpu,
            }
        }
    }

    impl EmotionClassificationModel for Scripted {
        type Options = ();

        fn new(_options: (), _device: Device) -> Result<Self> {
            unreachable!("built directly in tests")
        }

        fn mode(&self) -> PredictionMode {
            self.mode
        }

        fn predict(&self, text: &NormalizedText) -> Result<EmotionLabel> {
            if text.as_str().contains("explode") {
                panic!("boom");
            }
            if text.as_str().contains("broken") {
                return Err(EmotionError::Candle("shape mismatch".into()));
            }
            let best = self
                .scores
                .iter()
                .enumerate()
                .fold(0, |best, (i, s)| if *s > self.scores[best] { i } else { best });
            Ok(self.labels[best].clone())
        }

        fn predict_with_scores(&self, text: &NormalizedText) -> Result<ClassifierOutput> {
            let label = self.predict(text)?;
            if self.mode == PredictionMode::Point {
                return Ok(ClassifierOutput {
                    probabilities: vec![(label.clone(), 1.0)],
                    label,
                });
            }
            Ok(ClassifierOutput {
                label,
                probabilities: self.labels.iter().cloned().zip(self.scores.clone()).collect(),
            })
        }

        fn labels(&self) -> &[EmotionLabel] {
            &self.labels
        }

        fn info(&self) -> &ModelInfo {
            &self.info
        }

        fn device(&self) -> &Device {
            &self.device
        }
    }

    fn pipeline(model: Scripted) -> EmotionPipeline<Scripted> {
        EmotionPipeline::new(Arc::new(model), PipelineConfig::default())
    }

    fn six_classes() -> Scripted {
        Scripted::new(
            &["neutral", "happiness", "anger", "sadness", "stress", "awe"],
            &[0.05, 0.40, 0.10, 0.20, 0.20, 0.05],
            PredictionMode::Probabilistic,
        )
    }

    #[test]
    fn confidence_is_the_top_probability() {
        let prediction = pipeline(six_classes()).predict("what a lovely morning").unwrap();

        assert_eq!(prediction.emotion, EmotionLabel::Happiness);
        assert_eq!(prediction.confidence, 40.0);
        assert_eq!(prediction.profile.emoji, "😊");
        assert_eq!(prediction.normalized_text.as_str(), "lovely morning");
        assert_eq!(prediction.original_text, "what a lovely morning");
    }

    #[test]
    fn distribution_is_sorted_stable_and_truncated() {
        let prediction = pipeline(six_classes()).predict("lovely morning").unwrap();

        let order: Vec<&str> = prediction
            .probability_distribution
            .iter()
            .map(|(label, _)| label.as_str())
            .collect();
        assert_eq!(order, ["happiness", "sadness", "stress", "anger", "neutral", "awe"]);
        assert!((prediction.probability_distribution.total() - 100.0).abs() < 0.05);

        assert_eq!(prediction.all_probabilities.len(), 5);
        let scores: Vec<f64> = prediction.all_probabilities.iter().map(|(_, s)| *s).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn point_predictor_reports_full_confidence() {
        let model = Scripted::new(&["anger", "neutral"], &[0.9, 0.1], PredictionMode::Point);
        let prediction = pipeline(model).predict("furious about everything").unwrap();

        assert_eq!(prediction.confidence, 100.0);
        assert_eq!(prediction.all_probabilities.get(&EmotionLabel::Anger), Some(100.0));
        assert_eq!(prediction.all_probabilities.len(), 1);
    }

    #[test]
    fn empty_after_normalization_fails() {
        let pipeline = pipeline(six_classes());
        for text in ["", "   ", "http://x.com #tag @mention !!! 123", "it is a"] {
            assert_eq!(
                pipeline.predict(text).unwrap_err(),
                PredictError::EmptyAfterPreprocessing,
                "input: {text:?}"
            );
        }
    }

    #[test]
    fn unknown_label_gets_sentinel_metadata() {
        let model = Scripted::new(&["awe", "neutral"], &[0.7, 0.3], PredictionMode::Probabilistic);
        let prediction = pipeline(model).predict("stunning sunset").unwrap();

        assert_eq!(prediction.emotion.as_str(), "awe");
        assert_eq!(prediction.profile.emoji, "❓");
        assert_eq!(prediction.profile.intensity, Intensity::Unknown);
    }

    #[test]
    fn classifier_errors_and_panics_become_failures() {
        let pipeline = pipeline(six_classes());

        let error = pipeline.predict("broken input").unwrap_err();
        assert!(matches!(error, PredictError::Inference(ref m) if m.contains("shape mismatch")));

        let error = pipeline.predict("explode please").unwrap_err();
        assert!(matches!(error, PredictError::Inference(ref m) if m.contains("boom")));
    }

    #[test]
    fn batch_keeps_order_and_isolates_failures() {
        let pipeline = pipeline(six_classes());
        let output = pipeline
            .predict_many(&["lovely morning", "", "broken thing", "happy days"])
            .unwrap();

        assert_eq!(output.predictions.len(), 4);
        assert!(output.predictions[0].is_ok());
        assert_eq!(
            output.predictions[1].as_ref().unwrap_err(),
            &PredictError::EmptyAfterPreprocessing
        );
        assert!(output.predictions[2].is_err());
        assert_eq!(
            output.predictions[3].as_ref().unwrap().original_text,
            "happy days"
        );
        assert_eq!(output.stats.items_processed, 4);
        assert_eq!(output.stats.items_failed, 2);
    }

    #[test]
    fn sequential_and_parallel_batches_agree() {
        let texts = ["lovely morning", "", "broken thing", "happy days", "explode now"];
        let parallel = pipeline(six_classes()).predict_many(&texts).unwrap();
        let sequential = EmotionPipeline::new(
            Arc::new(six_classes()),
            PipelineConfig {
                parallel: false,
                ..PipelineConfig::default()
            },
        )
        .predict_many(&texts)
        .unwrap();

        let outcomes = |output: &BatchOutput| -> Vec<std::result::Result<String, PredictError>> {
            output
                .predictions
                .iter()
                .map(|p| p.as_ref().map(|p| p.original_text.clone()).map_err(Clone::clone))
                .collect()
        };
        assert_eq!(outcomes(&parallel), outcomes(&sequential));
        assert_eq!(outcomes(&sequential)[3].as_deref(), Ok("happy days"));
        assert_eq!(sequential.stats.items_processed, 5);
        assert_eq!(sequential.stats.items_failed, 3);
    }

    #[test]
    fn oversized_batch_is_rejected_up_front() {
        let pipeline = pipeline(six_classes());
        let texts = vec!["explode"; 51];

        match pipeline.predict_many(&texts) {
            Err(EmotionError::Validation(ValidationError::BatchTooLarge { max, actual })) => {
                assert_eq!((max, actual), (50, 51));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn run_dispatches_on_input_type() {
        let pipeline = pipeline(six_classes());

        let single = pipeline.run("lovely morning").unwrap();
        assert_eq!(single.stats.items_processed, 1);

        let batch = pipeline.run(&["lovely morning", "happy days"]).unwrap();
        assert_eq!(batch.predictions.len(), 2);

        assert!(pipeline.run("").is_err());
    }

    #[test]
    fn serializes_like_the_prediction_response() {
        let prediction = pipeline(six_classes()).predict("lovely morning").unwrap();
        let json = serde_json::to_value(&prediction).unwrap();

        assert_eq!(json["emotion"], "happiness");
        assert_eq!(json["emoji"], "😊");
        assert_eq!(json["intensity"], "positive");
        assert_eq!(json["processed_text"], "lovely morning");
        assert!(json.get("probability_distribution").is_none());

        let keys: Vec<&String> = json["all_probabilities"].as_object().unwrap().keys().collect();
        assert_eq!(keys[0], "happiness");
    }
}
