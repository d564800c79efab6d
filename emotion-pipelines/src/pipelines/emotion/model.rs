use crate::error::Result;
use crate::labels::EmotionLabel;
use crate::models::ModelInfo;
use crate::text::NormalizedText;

/// Whether a classifier can estimate class probabilities.
///
/// Decided once when the model is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMode {
    /// Only the winning label is available.
    Point,
    /// A probability for every class is available.
    Probabilistic,
}

/// Raw classifier output before it is shaped into a [`Prediction`](super::Prediction).
#[derive(Debug, Clone)]
pub struct ClassifierOutput {
    /// The predicted label.
    pub label: EmotionLabel,
    /// Probability per class in the model's class order, summing to 1.0. In
    /// [`PredictionMode::Point`] this holds only the predicted label at 1.0.
    pub probabilities: Vec<(EmotionLabel, f32)>,
}

pub trait EmotionClassificationModel: Send + Sync {
    type Options: std::fmt::Debug + Clone;

    fn new(options: Self::Options, device: candle_core::Device) -> Result<Self>
    where
        Self: Sized;

    fn mode(&self) -> PredictionMode;

    fn predict(&self, text: &NormalizedText) -> Result<EmotionLabel>;

    /// Predict a label together with the class distribution.
    ///
    /// Default implementation falls back to `predict` and assigns all mass to the
    /// predicted label, which is what point predictors report.
    fn predict_with_scores(&self, text: &NormalizedText) -> Result<ClassifierOutput> {
        let label = self.predict(text)?;
        Ok(ClassifierOutput {
            probabilities: vec![(label.clone(), 1.0)],
            label,
        })
    }

    /// Class labels in the order the model scores them.
    fn labels(&self) -> &[EmotionLabel];

    fn info(&self) -> &ModelInfo;

    fn device(&self) -> &candle_core::Device;
}
