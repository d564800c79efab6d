use emotion_pipelines::emotion::EmotionPipelineBuilder;
use emotion_pipelines::error::Result;
use emotion_pipelines::{EmotionService, PipelineConfig};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "emotion_pipelines=info".parse() {
        filter = filter.add_directive(directive);
    }
    fmt().with_env_filter(filter).init();
}

/// Usage: `test_sandbox [config.toml | artifact_dir] [text...]`
fn main() -> Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(arg) if arg.ends_with(".toml") => PipelineConfig::from_file(&arg)?,
        Some(dir) => PipelineConfig {
            artifact_dir: Some(dir.into()),
            ..PipelineConfig::default()
        },
        None => PipelineConfig {
            artifact_dir: Some("emotion-pipelines/tests/fixtures/model".into()),
            ..PipelineConfig::default()
        },
    };

    let pipeline = EmotionPipelineBuilder::from_config(config).build()?;
    let service = EmotionService::new(pipeline);

    let mut texts: Vec<String> = args.collect();
    if texts.is_empty() {
        texts = vec![
            "I am so happy today!".into(),
            "This deadline is making me anxious".into(),
            "https://example.com #nothing".into(),
        ];
    }

    let batch = service.handle_batch(Some(&json!({ "texts": texts })))?;
    println!("{}", serde_json::to_string_pretty(&batch)?);

    let messages: Vec<_> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| json!({"sender": format!("user{}", i % 2 + 1), "text": text}))
        .collect();
    let summary = service.analyze_conversation(&messages);
    tracing::info!(
        dominant = %summary.dominant_emotion,
        average_confidence = summary.average_confidence,
        skipped = summary.skipped_messages,
        "conversation summary"
    );

    println!("{}", serde_json::to_string_pretty(&service.health())?);
    Ok(())
}
