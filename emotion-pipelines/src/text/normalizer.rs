use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::lemmatizer::lemmatize;
use super::stopwords::is_stopword;

static LINKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+|https\S+").expect("valid link pattern"));
static MENTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+|#\w+").expect("valid mention pattern"));
static NON_LATIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z\s]").expect("valid alphabet pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Output of [`normalize`]: lowercase lemmas joined by single spaces.
///
/// Empty means nothing classifiable was left, which callers report as
/// [`PredictError::EmptyAfterPreprocessing`](crate::error::PredictError).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Clean raw text into the token sequence the feature transformer was fitted on.
///
/// The steps run in a fixed order, each relying on the shape left by the previous one:
/// lowercase, strip links, strip mentions and hashtags, keep only Latin letters and
/// whitespace, collapse whitespace, tokenize, drop stopwords (negations are kept), drop
/// tokens of two letters or fewer, lemmatize, join.
///
/// Deterministic and idempotent. Never fails; may return an empty value.
pub fn normalize(raw: &str) -> NormalizedText {
    let text = raw.to_lowercase();
    let text = LINKS.replace_all(&text, "");
    let text = MENTIONS.replace_all(&text, "");
    let text = NON_LATIN.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");

    let tokens: Vec<String> = text
        .trim()
        .split(' ')
        .filter(|token| !token.is_empty())
        .filter(|token| !is_stopword(token) && !is_link_residue(token))
        .filter(|token| token.len() > 2)
        .map(lemmatize)
        .collect();

    NormalizedText(tokens.join(" "))
}

// Punctuation removal can splice a link back together ("htt.ps//x" -> "httpsx");
// such tokens would be stripped on a second pass, so they go now.
fn is_link_residue(token: &str) -> bool {
    LINKS.is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_negations() {
        let normalized = normalize("I am not happy today");
        assert_eq!(normalized.as_str(), "not happy today");
    }

    #[test]
    fn strips_links_mentions_and_symbols() {
        assert!(normalize("http://x.com #tag @mention !!! 123").is_empty());
        assert_eq!(
            normalize("Check www.example.com @bob GREAT news!!!").as_str(),
            "check great news"
        );
    }

    #[test]
    fn empty_and_whitespace_inputs() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \t\n ").is_empty());
        assert!(normalize("I am so").is_empty());
    }

    #[test]
    fn drops_short_tokens_and_lemmatizes() {
        assert_eq!(normalize("My days are ok").as_str(), "day");
        assert_eq!(
            normalize("Feelings, feelings everywhere").as_str(),
            "feeling feeling everywhere"
        );
        assert_eq!(normalize("Movies, buses and potatoes").as_str(), "movie bus potato");
    }

    #[test]
    fn non_latin_letters_are_removed() {
        assert_eq!(normalize("café naïve").as_str(), "caf nave");
    }

    #[test]
    fn spliced_links_are_dropped() {
        assert_eq!(normalize("htt.ps//evil stuff").as_str(), "stuff");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "I am not happy today",
            "http://x.com #tag @mention !!! 123",
            "OMG!!! The parties were AMAZING, children everywhere :) www.fun.com",
            "Never felt so stressed... deadlines, meetings & emails",
            "htt.ps//evil wwwx stuff",
            "The wills of the mens were read",
            "  multiple   spaces\tand\nnewlines  ",
        ];
        for sample in samples {
            let once = normalize(sample);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "{sample}");
        }
    }
}
