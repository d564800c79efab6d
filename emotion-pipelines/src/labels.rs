//! Emotion labels and their static display metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse polarity attached to each emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Positive,
    Negative,
    Neutral,
    /// Only used for labels outside the known set.
    Unknown,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Positive => "positive",
            Intensity::Negative => "negative",
            Intensity::Neutral => "neutral",
            Intensity::Unknown => "unknown",
        }
    }
}

/// Display metadata for an emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmotionProfile {
    pub emoji: &'static str,
    pub color: &'static str,
    pub description: &'static str,
    pub intensity: Intensity,
}

/// Returned for any label the classifier emits that has no known profile.
pub const UNKNOWN_PROFILE: EmotionProfile = EmotionProfile {
    emoji: "❓",
    color: "#000000",
    description: "Unknown emotion",
    intensity: Intensity::Unknown,
};

/// An emotion category.
///
/// The five known emotions carry static metadata. Any other class name coming out of a
/// model artifact is kept verbatim in [`EmotionLabel::Unknown`] so the prediction can
/// still be served.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmotionLabel {
    Happiness,
    Anger,
    Sadness,
    Stress,
    Neutral,
    Unknown(String),
}

impl EmotionLabel {
    /// The known labels, in display order.
    pub const KNOWN: [EmotionLabel; 5] = [
        EmotionLabel::Happiness,
        EmotionLabel::Anger,
        EmotionLabel::Sadness,
        EmotionLabel::Stress,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            EmotionLabel::Happiness => "happiness",
            EmotionLabel::Anger => "anger",
            EmotionLabel::Sadness => "sadness",
            EmotionLabel::Stress => "stress",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, EmotionLabel::Unknown(_))
    }

    /// Static metadata for this label, or [`UNKNOWN_PROFILE`].
    pub fn profile(&self) -> EmotionProfile {
        match self {
            EmotionLabel::Happiness => EmotionProfile {
                emoji: "😊",
                color: "#FFD700",
                description: "Joyful, content, or pleased feeling",
                intensity: Intensity::Positive,
            },
            EmotionLabel::Anger => EmotionProfile {
                emoji: "😠",
                color: "#DC143C",
                description: "Irritated, frustrated, or furious feeling",
                intensity: Intensity::Negative,
            },
            EmotionLabel::Sadness => EmotionProfile {
                emoji: "😢",
                color: "#4169E1",
                description: "Unhappy, sorrowful, or depressed feeling",
                intensity: Intensity::Negative,
            },
            EmotionLabel::Stress => EmotionProfile {
                emoji: "😰",
                color: "#FF8C00",
                description: "Anxious, overwhelmed, or tense feeling",
                intensity: Intensity::Negative,
            },
            EmotionLabel::Neutral => EmotionProfile {
                emoji: "😐",
                color: "#808080",
                description: "No strong emotion detected",
                intensity: Intensity::Neutral,
            },
            EmotionLabel::Unknown(_) => UNKNOWN_PROFILE,
        }
    }

    /// Sentiment bucket used for conversation summaries. Unknown labels have none.
    pub fn sentiment(&self) -> Option<Sentiment> {
        match self {
            EmotionLabel::Happiness => Some(Sentiment::Positive),
            EmotionLabel::Anger | EmotionLabel::Sadness | EmotionLabel::Stress => {
                Some(Sentiment::Negative)
            }
            EmotionLabel::Neutral => Some(Sentiment::Neutral),
            EmotionLabel::Unknown(_) => None,
        }
    }
}

impl From<&str> for EmotionLabel {
    fn from(value: &str) -> Self {
        match value {
            "happiness" => EmotionLabel::Happiness,
            "anger" => EmotionLabel::Anger,
            "sadness" => EmotionLabel::Sadness,
            "stress" => EmotionLabel::Stress,
            "neutral" => EmotionLabel::Neutral,
            other => EmotionLabel::Unknown(other.to_string()),
        }
    }
}

impl From<String> for EmotionLabel {
    fn from(value: String) -> Self {
        match EmotionLabel::from(value.as_str()) {
            EmotionLabel::Unknown(_) => EmotionLabel::Unknown(value),
            known => known,
        }
    }
}

impl From<EmotionLabel> for String {
    fn from(value: EmotionLabel) -> Self {
        match value {
            EmotionLabel::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three buckets of a conversation's sentiment summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// A known label together with its metadata, as listed by the `emotions` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EmotionDescriptor {
    pub label: EmotionLabel,
    #[serde(flatten)]
    pub profile: EmotionProfile,
}

/// Every known label with its metadata, in display order.
pub fn catalog() -> Vec<EmotionDescriptor> {
    EmotionLabel::KNOWN
        .iter()
        .map(|label| EmotionDescriptor {
            label: label.clone(),
            profile: label.profile(),
        })
        .collect()
}
