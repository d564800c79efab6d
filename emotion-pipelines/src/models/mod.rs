// ============ Internal API ============

pub(crate) mod artifacts;
pub(crate) mod linear;
pub(crate) mod tfidf;

// ============ Public API ============

pub use artifacts::{
    ArtifactOptions, ArtifactPaths, ModelInfo, CLASSIFIER_FILE, MODEL_INFO_FILE, VECTORIZER_FILE,
};
pub use linear::{ClassifierArtifact, ClassifierKind, LinearClassifier, TfidfLinearModel};
pub use tfidf::{Norm, TfidfArtifact, TfidfVectorizer};
