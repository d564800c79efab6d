use std::path::PathBuf;

use emotion_pipelines::cache::global_cache;
use emotion_pipelines::emotion::EmotionPipelineBuilder;
use emotion_pipelines::error::Result;
use emotion_pipelines::utils::DeviceSelectable;
use emotion_pipelines::PipelineConfig;

#[test]
fn pipelines_share_one_loaded_model() -> Result<()> {
    global_cache().clear();
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/model");

    let mut pipelines = Vec::new();
    for config in [
        PipelineConfig::default(),
        PipelineConfig {
            parallel: false,
            ..PipelineConfig::default()
        },
    ] {
        pipelines.push(EmotionPipelineBuilder::from_artifacts(&dir).cpu().config(config).build()?);
    }
    pipelines.push(EmotionPipelineBuilder::from_artifacts(dir.join(".")).build()?);

    assert_eq!(global_cache().len(), 1);
    assert!(pipelines[0].config().parallel);
    assert!(!pipelines[1].config().parallel);

    let first = pipelines[0].predict("so happy")?;
    let second = pipelines[2].predict("so happy")?;
    assert_eq!(first.confidence, second.confidence);
    Ok(())
}
