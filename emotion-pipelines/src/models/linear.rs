//! Linear emotion classifier over TF-IDF features, evaluated with Candle.

use std::collections::HashSet;

use candle_core::{Device, Tensor};
use serde::Deserialize;

use super::artifacts::{load_model_info, read_json, ArtifactOptions, ModelInfo};
use super::tfidf::{TfidfArtifact, TfidfVectorizer};
use crate::error::{ArtifactError, Result};
use crate::labels::EmotionLabel;
use crate::pipelines::emotion::{ClassifierOutput, EmotionClassificationModel, PredictionMode};
use crate::text::NormalizedText;

/// Estimator family the weights were exported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// Multinomial logistic regression. Softmax over decision scores.
    LogisticRegression,
    /// Multinomial naive Bayes. `coef` holds feature log-probabilities and
    /// `intercept` the class log-priors, so the joint log-likelihood is linear too.
    MultinomialNb,
    /// Linear support vector machine. Decision scores only.
    LinearSvc,
}

impl ClassifierKind {
    pub fn mode(&self) -> PredictionMode {
        match self {
            ClassifierKind::LogisticRegression | ClassifierKind::MultinomialNb => {
                PredictionMode::Probabilistic
            }
            ClassifierKind::LinearSvc => PredictionMode::Point,
        }
    }
}

/// Serialized form of a fitted classifier (`classifier.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierArtifact {
    pub kind: ClassifierKind,
    pub classes: Vec<String>,
    /// One row per class, one column per feature.
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

/// `scores = x · W + b` over a fixed class order.
pub struct LinearClassifier {
    kind: ClassifierKind,
    labels: Vec<EmotionLabel>,
    // (features, classes), stored transposed so a row vector multiplies directly.
    weights: Tensor,
    bias: Tensor,
    n_features: usize,
}

impl LinearClassifier {
    /// Validate a deserialized artifact against the feature dimension and upload the
    /// weights to `device`.
    pub fn from_artifact(
        artifact: ClassifierArtifact,
        n_features: usize,
        device: &Device,
    ) -> Result<Self> {
        let ClassifierArtifact {
            kind,
            classes,
            coef,
            intercept,
        } = artifact;

        let n_classes = classes.len();
        if n_classes < 2 {
            return Err(ArtifactError::invalid(
                "classifier",
                format!("expected at least 2 classes, found {n_classes}"),
            )
            .into());
        }

        let mut seen = HashSet::new();
        for class in &classes {
            if class.trim().is_empty() {
                return Err(ArtifactError::invalid("classifier", "empty class name").into());
            }
            if !seen.insert(class.as_str()) {
                return Err(ArtifactError::invalid(
                    "classifier",
                    format!("duplicate class '{class}'"),
                )
                .into());
            }
        }

        if coef.len() != n_classes {
            return Err(ArtifactError::invalid(
                "classifier",
                format!("coef has {} rows for {n_classes} classes", coef.len()),
            )
            .into());
        }
        if let Some((row, weights)) = coef
            .iter()
            .enumerate()
            .find(|(_, weights)| weights.len() != n_features)
        {
            return Err(ArtifactError::invalid(
                "classifier",
                format!(
                    "coef row {row} has {} weights but the vectorizer produces {n_features} features",
                    weights.len()
                ),
            )
            .into());
        }
        if intercept.len() != n_classes {
            return Err(ArtifactError::invalid(
                "classifier",
                format!(
                    "intercept has {} entries for {n_classes} classes",
                    intercept.len()
                ),
            )
            .into());
        }

        let flat: Vec<f32> = coef.into_iter().flatten().collect();
        let weights = Tensor::from_vec(flat, (n_classes, n_features), device)?
            .t()?
            .contiguous()?;
        let bias = Tensor::from_vec(intercept, n_classes, device)?;

        Ok(Self {
            kind,
            labels: classes.into_iter().map(EmotionLabel::from).collect(),
            weights,
            bias,
            n_features,
        })
    }

    pub fn kind(&self) -> ClassifierKind {
        self.kind
    }

    pub fn labels(&self) -> &[EmotionLabel] {
        &self.labels
    }

    /// Raw per-class decision scores, shape `(1, classes)`.
    fn scores(&self, features: Vec<f32>) -> Result<Tensor> {
        let x = Tensor::from_vec(features, (1, self.n_features), self.weights.device())?;
        Ok(x.matmul(&self.weights)?.broadcast_add(&self.bias)?)
    }

    /// Per-class decision scores in class order.
    pub fn decision_function(&self, features: Vec<f32>) -> Result<Vec<f32>> {
        Ok(self.scores(features)?.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// Per-class probabilities in class order, or `None` for point predictors.
    pub fn predict_proba(&self, features: Vec<f32>) -> Result<Option<Vec<f32>>> {
        if self.kind.mode() == PredictionMode::Point {
            return Ok(None);
        }
        let scores = self.scores(features)?;
        let probabilities = candle_nn::ops::softmax_last_dim(&scores)?
            .squeeze(0)?
            .to_vec1::<f32>()?;
        Ok(Some(probabilities))
    }
}

/// Index of the first maximum.
fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = i;
        }
    }
    best
}

/// TF-IDF vectorizer + linear classifier + declared identity, loaded from a model
/// directory.
pub struct TfidfLinearModel {
    vectorizer: TfidfVectorizer,
    classifier: LinearClassifier,
    info: ModelInfo,
    device: Device,
}

impl TfidfLinearModel {
    pub fn from_parts(
        vectorizer: TfidfVectorizer,
        classifier: LinearClassifier,
        info: ModelInfo,
        device: Device,
    ) -> Self {
        Self {
            vectorizer,
            classifier,
            info,
            device,
        }
    }
}

impl EmotionClassificationModel for TfidfLinearModel {
    type Options = ArtifactOptions;

    fn new(options: Self::Options, device: Device) -> Result<Self> {
        let paths = options.paths();

        let vectorizer =
            TfidfVectorizer::from_artifact(read_json::<TfidfArtifact>(&paths.vectorizer)?)?;
        let classifier = LinearClassifier::from_artifact(
            read_json::<ClassifierArtifact>(&paths.classifier)?,
            vectorizer.dimension(),
            &device,
        )?;
        let info = load_model_info(&paths.model_info)?;

        for label in classifier.labels().iter().filter(|label| !label.is_known()) {
            tracing::warn!(
                class = %label,
                "model class has no emotion metadata; it will be served as unknown"
            );
        }

        tracing::info!(
            model = %info.model_name,
            classes = classifier.labels().len(),
            vocabulary = vectorizer.vocabulary_size(),
            mode = ?classifier.kind().mode(),
            dir = %options.dir.display(),
            "emotion model loaded"
        );

        Ok(Self::from_parts(vectorizer, classifier, info, device))
    }

    fn mode(&self) -> PredictionMode {
        self.classifier.kind().mode()
    }

    fn predict(&self, text: &NormalizedText) -> Result<EmotionLabel> {
        let features = self.vectorizer.transform(text.as_str());
        let scores = self.classifier.decision_function(features)?;
        Ok(self.classifier.labels()[argmax(&scores)].clone())
    }

    fn predict_with_scores(&self, text: &NormalizedText) -> Result<ClassifierOutput> {
        let features = self.vectorizer.transform(text.as_str());
        let Some(probabilities) = self.classifier.predict_proba(features)? else {
            let label = self.predict(text)?;
            return Ok(ClassifierOutput {
                probabilities: vec![(label.clone(), 1.0)],
                label,
            });
        };

        let label = self.classifier.labels()[argmax(&probabilities)].clone();
        Ok(ClassifierOutput {
            label,
            probabilities: self
                .classifier
                .labels()
                .iter()
                .cloned()
                .zip(probabilities)
                .collect(),
        })
    }

    fn labels(&self) -> &[EmotionLabel] {
        self.classifier.labels()
    }

    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn device(&self) -> &Device {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::normalize;

    fn vectorizer() -> TfidfVectorizer {
        let artifact: TfidfArtifact = serde_json::from_str(
            r#"{"vocabulary": {"happy": 0, "angry": 1, "calm": 2}, "idf": [1.0, 1.0, 1.0]}"#,
        )
        .unwrap();
        TfidfVectorizer::from_artifact(artifact).unwrap()
    }

    fn classifier(kind: ClassifierKind) -> ClassifierArtifact {
        ClassifierArtifact {
            kind,
            classes: vec!["happiness".into(), "anger".into(), "neutral".into()],
            coef: vec![
                vec![4.0, -1.0, 0.0],
                vec![-1.0, 4.0, 0.0],
                vec![0.0, 0.0, 2.0],
            ],
            intercept: vec![0.0, 0.0, 0.5],
        }
    }

    fn model(kind: ClassifierKind) -> TfidfLinearModel {
        let vectorizer = vectorizer();
        let classifier =
            LinearClassifier::from_artifact(classifier(kind), vectorizer.dimension(), &Device::Cpu)
                .unwrap();
        let info = ModelInfo {
            model_name: "test".into(),
            version: None,
            trained_at: None,
            accuracy: None,
            description: None,
        };
        TfidfLinearModel::from_parts(vectorizer, classifier, info, Device::Cpu)
    }

    #[test]
    fn probabilities_follow_class_order_and_sum_to_one() {
        let model = model(ClassifierKind::LogisticRegression);
        let output = model.predict_with_scores(&normalize("so happy")).unwrap();

        assert_eq!(output.label, EmotionLabel::Happiness);
        let labels: Vec<_> = output.probabilities.iter().map(|(l, _)| l.clone()).collect();
        assert_eq!(labels, model.labels());
        let total: f32 = output.probabilities.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn point_predictor_reports_certainty() {
        let model = model(ClassifierKind::LinearSvc);
        assert_eq!(model.mode(), PredictionMode::Point);

        let output = model.predict_with_scores(&normalize("angry angry")).unwrap();
        assert_eq!(output.label, EmotionLabel::Anger);
        assert_eq!(output.probabilities, vec![(EmotionLabel::Anger, 1.0)]);
    }

    #[test]
    fn out_of_vocabulary_falls_back_to_intercept() {
        let model = model(ClassifierKind::MultinomialNb);
        let label = model.predict(&normalize("zebra")).unwrap();
        assert_eq!(label, EmotionLabel::Neutral);
    }

    #[test]
    fn rejects_feature_dimension_mismatch() {
        let mut artifact = classifier(ClassifierKind::LogisticRegression);
        artifact.coef[1].push(1.0);
        let result = LinearClassifier::from_artifact(artifact, 3, &Device::Cpu);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_duplicate_classes() {
        let mut artifact = classifier(ClassifierKind::LogisticRegression);
        artifact.classes[2] = "anger".into();
        let result = LinearClassifier::from_artifact(artifact, 3, &Device::Cpu);
        assert!(result.is_err());
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }
}
