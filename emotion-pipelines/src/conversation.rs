//! Conversation-level aggregation of per-message predictions.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::labels::{EmotionLabel, Sentiment};
use crate::pipelines::emotion::{EmotionPredictor, PredictionResult};
use crate::pipelines::emotion::pipeline::round2;

/// Emoji reported when the dominant emotion has no known profile.
const FALLBACK_DOMINANT_EMOJI: &str = "😐";

/// Per-label message counts in the order labels were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmotionCounts(Vec<(EmotionLabel, usize)>);

impl EmotionCounts {
    fn increment(&mut self, label: &EmotionLabel) {
        match self.0.iter_mut().find(|(seen, _)| seen == label) {
            Some((_, count)) => *count += 1,
            None => self.0.push((label.clone(), 1)),
        }
    }

    pub fn get(&self, label: &EmotionLabel) -> usize {
        self.0
            .iter()
            .find(|(seen, _)| seen == label)
            .map_or(0, |(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(EmotionLabel, usize)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, count)| count).sum()
    }

    /// Label with the highest count. On ties the label seen first wins.
    pub fn dominant(&self) -> Option<&EmotionLabel> {
        let mut best: Option<&(EmotionLabel, usize)> = None;
        for entry in &self.0 {
            if best.map_or(true, |(_, count)| entry.1 > *count) {
                best = Some(entry);
            }
        }
        best.map(|(label, _)| label)
    }

    fn count_sentiment(&self, sentiment: Sentiment) -> usize {
        self.0
            .iter()
            .filter(|(label, _)| label.sentiment() == Some(sentiment))
            .map(|(_, count)| count)
            .sum()
    }
}

impl Serialize for EmotionCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, count) in &self.0 {
            map.serialize_entry(label.as_str(), count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentBucket {
    pub count: usize,
    /// Share of analyzed messages, rounded to two decimals.
    pub percentage: f64,
}

impl SentimentBucket {
    fn new(count: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            0.0
        } else {
            round2(count as f64 / total as f64 * 100.0)
        };
        Self { count, percentage }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentSummary {
    pub positive: SentimentBucket,
    pub negative: SentimentBucket,
    pub neutral: SentimentBucket,
}

/// An input message with its prediction attached.
///
/// Serializes as the original message object with `emotion`, `confidence` and `emoji`
/// set. A field of the same name keeps its position and takes the new value; missing
/// ones are appended in that order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedMessage {
    pub fields: Map<String, Value>,
    pub emotion: EmotionLabel,
    pub confidence: f64,
    pub emoji: &'static str,
}

const ANNOTATION_KEYS: [&str; 3] = ["emotion", "confidence", "emoji"];

impl AnnotatedMessage {
    fn serialize_annotation<M: SerializeMap>(
        &self,
        map: &mut M,
        key: &str,
    ) -> Result<(), M::Error> {
        match key {
            "emotion" => map.serialize_entry(key, &self.emotion),
            "confidence" => map.serialize_entry(key, &self.confidence),
            _ => map.serialize_entry(key, self.emoji),
        }
    }
}

impl Serialize for AnnotatedMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.fields {
            if ANNOTATION_KEYS.contains(&key.as_str()) {
                self.serialize_annotation(&mut map, key)?;
            } else {
                map.serialize_entry(key, value)?;
            }
        }
        for key in ANNOTATION_KEYS {
            if !self.fields.contains_key(key) {
                self.serialize_annotation(&mut map, key)?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    /// Number of messages that were analyzed successfully.
    pub total_messages: usize,
    pub dominant_emotion: EmotionLabel,
    pub dominant_emoji: &'static str,
    /// Mean confidence of analyzed messages, rounded to two decimals.
    pub average_confidence: f64,
    pub emotion_distribution: EmotionCounts,
    pub sentiment_summary: SentimentSummary,
    pub analyzed_messages: Vec<AnnotatedMessage>,
    /// Messages left out because they had no usable text or their prediction failed.
    pub skipped_messages: usize,
}

/// Aggregates the predictions of a sequence of chat messages.
///
/// Each message is a JSON object; its `text` field is predicted and every other field
/// is carried through untouched.
pub struct ConversationAnalyzer<'p, P: EmotionPredictor + ?Sized> {
    predictor: &'p P,
    parallel: bool,
}

impl<'p, P: EmotionPredictor + ?Sized> ConversationAnalyzer<'p, P> {
    pub fn new(predictor: &'p P) -> Self {
        Self {
            predictor,
            parallel: false,
        }
    }

    /// Predict messages on the rayon pool. Aggregation still follows input order.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn analyze(&self, messages: &[Value]) -> ConversationSummary {
        let span = tracing::debug_span!("analyze_conversation", messages = messages.len());
        let _guard = span.enter();

        let candidates: Vec<(&Map<String, Value>, &str)> = messages
            .iter()
            .filter_map(|message| {
                let fields = message.as_object()?;
                let text = fields.get("text")?.as_str()?;
                Some((fields, text))
            })
            .collect();

        let texts: Vec<&str> = candidates.iter().map(|(_, text)| *text).collect();
        let results = self.predictor.predict_all(&texts, self.parallel);

        let summary = summarize(
            candidates.iter().map(|(fields, _)| *fields).zip(results),
            messages.len(),
        );
        tracing::debug!(
            analyzed = summary.total_messages,
            skipped = summary.skipped_messages,
            dominant = %summary.dominant_emotion,
            "conversation analyzed"
        );
        summary
    }
}

fn summarize<'m>(
    results: impl Iterator<Item = (&'m Map<String, Value>, PredictionResult)>,
    submitted: usize,
) -> ConversationSummary {
    let mut analyzed_messages = Vec::new();
    let mut counts = EmotionCounts::default();
    let mut confidence_sum = 0.0;

    for (fields, result) in results {
        let Ok(prediction) = result else {
            continue;
        };
        counts.increment(&prediction.emotion);
        confidence_sum += prediction.confidence;
        analyzed_messages.push(AnnotatedMessage {
            fields: fields.clone(),
            emoji: prediction.profile.emoji,
            emotion: prediction.emotion,
            confidence: prediction.confidence,
        });
    }

    let total = analyzed_messages.len();
    let average_confidence = if total == 0 {
        0.0
    } else {
        round2(confidence_sum / total as f64)
    };

    let dominant_emotion = counts
        .dominant()
        .cloned()
        .unwrap_or(EmotionLabel::Neutral);
    let dominant_emoji = if dominant_emotion.is_known() {
        dominant_emotion.profile().emoji
    } else {
        FALLBACK_DOMINANT_EMOJI
    };

    let sentiment_summary = SentimentSummary {
        positive: SentimentBucket::new(counts.count_sentiment(Sentiment::Positive), total),
        negative: SentimentBucket::new(counts.count_sentiment(Sentiment::Negative), total),
        neutral: SentimentBucket::new(counts.count_sentiment(Sentiment::Neutral), total),
    };

    ConversationSummary {
        total_messages: total,
        dominant_emotion,
        dominant_emoji,
        average_confidence,
        emotion_distribution: counts,
        sentiment_summary,
        analyzed_messages,
        skipped_messages: submitted - total,
    }
}
