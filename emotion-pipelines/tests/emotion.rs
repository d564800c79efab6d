use std::path::PathBuf;

use emotion_pipelines::emotion::{
    EmotionPipeline, EmotionPipelineBuilder, PredictionMode, TfidfLinearModel,
};
use emotion_pipelines::error::{ArtifactError, EmotionError, PredictError, Result, ValidationError};
use emotion_pipelines::labels::{EmotionLabel, Intensity};
use emotion_pipelines::utils::DeviceSelectable;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn pipeline(name: &str) -> Result<EmotionPipeline<TfidfLinearModel>> {
    EmotionPipelineBuilder::from_artifacts(fixture(name)).cpu().build()
}

#[test]
fn predicts_known_emotions() -> Result<()> {
    let pipeline = pipeline("model")?;
    assert_eq!(pipeline.mode(), PredictionMode::Probabilistic);
    assert_eq!(pipeline.model_info().model_name, "Logistic Regression");

    let happy = pipeline.predict("I am so happy")?;
    assert_eq!(happy.emotion, EmotionLabel::Happiness);
    assert_eq!(happy.normalized_text.as_str(), "happy");
    assert_eq!(happy.profile.color, "#FFD700");

    assert_eq!(pipeline.predict("I am furious")?.emotion, EmotionLabel::Anger);
    assert_eq!(pipeline.predict("not feeling well")?.emotion, EmotionLabel::Sadness);
    assert_eq!(
        pipeline.predict("Deadlines everywhere, so anxious")?.emotion,
        EmotionLabel::Stress
    );
    Ok(())
}

#[test]
fn distribution_invariants() -> Result<()> {
    let pipeline = pipeline("model")?;
    let prediction = pipeline.predict("lonely and sad, but the weather is fine")?;

    let full = &prediction.probability_distribution;
    assert_eq!(full.len(), 5);
    assert!((full.total() - 100.0).abs() < 0.05);

    let top: Vec<f64> = prediction.all_probabilities.iter().map(|(_, p)| *p).collect();
    assert!(top.len() <= 5);
    assert!(top.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(prediction.confidence, top[0]);
    assert_eq!(
        prediction.all_probabilities.get(&prediction.emotion),
        Some(prediction.confidence)
    );
    Ok(())
}

#[test]
fn degenerate_text_fails_without_aborting() -> Result<()> {
    let pipeline = pipeline("model")?;
    for text in ["", "http://x.com #tag @mention !!! 123"] {
        assert_eq!(
            pipeline.predict(text).unwrap_err(),
            PredictError::EmptyAfterPreprocessing
        );
    }
    Ok(())
}

#[test]
fn out_of_vocabulary_text_is_neutral() -> Result<()> {
    let pipeline = pipeline("model")?;
    assert_eq!(pipeline.predict("quantum mechanics lecture")?.emotion, EmotionLabel::Neutral);
    Ok(())
}

#[test]
fn batch_of_fifty_keeps_order() -> Result<()> {
    let pipeline = pipeline("model")?;
    let texts: Vec<String> = (0..50)
        .map(|i| match i % 3 {
            0 => format!("happy message number {i}"),
            1 => format!("angry message number {i}"),
            _ => "!!!".to_string(),
        })
        .collect();

    let output = pipeline.predict_many(&texts)?;
    assert_eq!(output.predictions.len(), 50);
    assert_eq!(output.stats.items_processed, 50);

    for (i, (text, result)) in texts.iter().zip(&output.predictions).enumerate() {
        match i % 3 {
            2 => assert!(result.is_err()),
            _ => assert_eq!(&result.as_ref().unwrap().original_text, text),
        }
    }
    Ok(())
}

#[test]
fn batch_of_fifty_one_is_rejected() -> Result<()> {
    let pipeline = pipeline("model")?;
    let texts = vec!["happy"; 51];

    let error = pipeline.predict_many(&texts).unwrap_err();
    assert!(matches!(
        error,
        EmotionError::Validation(ValidationError::BatchTooLarge { max: 50, actual: 51 })
    ));
    Ok(())
}

#[test]
fn unknown_class_is_served_with_sentinel_metadata() -> Result<()> {
    let pipeline = pipeline("unknown_label")?;
    let prediction = pipeline.predict("what a beautiful sunset")?;

    assert_eq!(prediction.emotion, EmotionLabel::Unknown("awe".into()));
    assert_eq!(prediction.profile.emoji, "❓");
    assert_eq!(prediction.profile.color, "#000000");
    assert_eq!(prediction.profile.description, "Unknown emotion");
    assert_eq!(prediction.profile.intensity, Intensity::Unknown);
    Ok(())
}

#[test]
fn point_classifier_reports_certainty() -> Result<()> {
    let pipeline = pipeline("point")?;
    assert_eq!(pipeline.mode(), PredictionMode::Point);

    let prediction = pipeline.predict("I hate this")?;
    assert_eq!(prediction.emotion, EmotionLabel::Anger);
    assert_eq!(prediction.confidence, 100.0);
    assert_eq!(prediction.all_probabilities.len(), 1);
    Ok(())
}

#[test]
fn missing_artifacts_fail_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let result = EmotionPipelineBuilder::from_artifacts(dir.path()).build();

    assert!(matches!(
        result,
        Err(EmotionError::Artifact(ArtifactError::Missing { .. }))
    ));
}

#[test]
fn inconsistent_artifacts_fail_the_build() {
    let dir = tempfile::tempdir().unwrap();
    for file in ["vectorizer.json", "model_info.json"] {
        std::fs::copy(fixture("model").join(file), dir.path().join(file)).unwrap();
    }
    std::fs::write(
        dir.path().join("classifier.json"),
        r#"{"kind": "logistic_regression", "classes": ["happiness", "anger"],
            "coef": [[1.0], [2.0]], "intercept": [0.0, 0.0]}"#,
    )
    .unwrap();

    let result = EmotionPipelineBuilder::from_artifacts(dir.path()).build();
    assert!(matches!(
        result,
        Err(EmotionError::Artifact(ArtifactError::Invalid { .. }))
    ));
}

#[test]
fn run_accepts_single_and_batch_input() -> Result<()> {
    let pipeline = pipeline("model")?;

    let single = pipeline.run("love this")?;
    assert_eq!(single.prediction.emotion, EmotionLabel::Happiness);

    let batch = pipeline.run(&["love this", "crying alone", ""])?;
    assert_eq!(batch.predictions.len(), 3);
    assert_eq!(batch.stats.items_failed, 1);
    Ok(())
}
