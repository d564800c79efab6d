//! TF-IDF feature transformer.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ArtifactError;

/// Vector normalization applied after IDF weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// Serialized form of a fitted vectorizer (`vectorizer.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfArtifact {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f32>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// Maps normalized text to a dense, fixed-length feature vector.
///
/// Terms are whitespace-separated word n-grams. Term counts are optionally dampened
/// (`1 + ln(tf)`), weighted by IDF, then normalized.
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Option<Norm>,
}

impl std::fmt::Debug for TfidfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfidfVectorizer")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("ngram_range", &self.ngram_range)
            .field("sublinear_tf", &self.sublinear_tf)
            .field("norm", &self.norm)
            .finish()
    }
}

impl TfidfVectorizer {
    /// Validate a deserialized artifact and build the transformer.
    pub fn from_artifact(artifact: TfidfArtifact) -> Result<Self, ArtifactError> {
        let TfidfArtifact {
            vocabulary,
            idf,
            ngram_range,
            sublinear_tf,
            norm,
        } = artifact;

        if vocabulary.is_empty() {
            return Err(ArtifactError::invalid("vectorizer", "vocabulary is empty"));
        }
        if idf.len() != vocabulary.len() {
            return Err(ArtifactError::invalid(
                "vectorizer",
                format!(
                    "idf has {} weights for {} vocabulary terms",
                    idf.len(),
                    vocabulary.len()
                ),
            ));
        }
        if let Some((term, &column)) = vocabulary.iter().find(|&(_, &col)| col >= idf.len()) {
            return Err(ArtifactError::invalid(
                "vectorizer",
                format!("term '{term}' maps to column {column} out of {}", idf.len()),
            ));
        }
        let (min_n, max_n) = ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ArtifactError::invalid(
                "vectorizer",
                format!("invalid ngram_range ({min_n}, {max_n})"),
            ));
        }

        Ok(Self {
            vocabulary,
            idf,
            ngram_range,
            sublinear_tf,
            norm,
        })
    }

    /// Length of every vector produced by [`transform`](Self::transform).
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn transform(&self, text: &str) -> Vec<f32> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut features = vec![0.0f32; self.dimension()];

        let (min_n, max_n) = self.ngram_range;
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                let term = window.join(" ");
                if let Some(&column) = self.vocabulary.get(&term) {
                    features[column] += 1.0;
                }
            }
        }

        for (value, idf) in features.iter_mut().zip(&self.idf) {
            if *value > 0.0 {
                if self.sublinear_tf {
                    *value = 1.0 + value.ln();
                }
                *value *= idf;
            }
        }

        let length = match self.norm {
            Some(Norm::L2) => features.iter().map(|v| v * v).sum::<f32>().sqrt(),
            Some(Norm::L1) => features.iter().map(|v| v.abs()).sum::<f32>(),
            None => 0.0,
        };
        if length > 0.0 {
            for value in &mut features {
                *value /= length;
            }
        }

        features
    }
}
