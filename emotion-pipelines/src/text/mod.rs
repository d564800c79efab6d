//! Text normalization applied before feature extraction.

pub(crate) mod lemmatizer;
pub(crate) mod normalizer;
pub(crate) mod stopwords;

pub use lemmatizer::lemmatize;
pub use normalizer::{normalize, NormalizedText};
pub use stopwords::{is_stopword, NEGATIONS};
