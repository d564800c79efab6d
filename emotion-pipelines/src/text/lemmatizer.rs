//! Dictionary-free noun lemmatizer.
//!
//! Mirrors the default (noun) reduction of WordNet-style lemmatizers: irregular plurals
//! come from a table, a handful of nouns that merely end in `s` are left alone, and the
//! remaining plurals are reduced by suffix rules. Every output is a fixed point:
//! `lemmatize(lemmatize(w)) == lemmatize(w)`.

use super::stopwords::is_stopword;

const IRREGULAR: [(&str, &str); 28] = [
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("wolves", "wolf"),
    ("leaves", "leaf"),
    ("knives", "knife"),
    ("lives", "life"),
    ("wives", "wife"),
    ("selves", "self"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("thieves", "thief"),
    ("loaves", "loaf"),
    ("calves", "calf"),
    ("oxen", "ox"),
    ("crises", "crisis"),
    ("analyses", "analysis"),
    ("diagnoses", "diagnosis"),
    ("potatoes", "potato"),
    ("tomatoes", "tomato"),
    ("heroes", "hero"),
    ("echoes", "echo"),
    ("buses", "bus"),
    ("viruses", "virus"),
];

/// Nouns whose plural ends in `ies` but whose base keeps the `ie`.
const IE_NOUNS: [&str; 7] = [
    "movie", "cookie", "zombie", "selfie", "rookie", "smoothie", "brownie",
];

const INVARIANT: [&str; 19] = [
    "news", "series", "species", "lens", "bias", "atlas", "canvas", "alias", "gas", "yes",
    "always", "perhaps", "whereas", "various", "sometimes", "nevertheless", "chaos", "thanks",
    "goes",
];

/// Reduce `token` to its base form.
///
/// A reduction is discarded when the base would be two letters or fewer, or would be a
/// stopword; the token is then returned unchanged.
pub fn lemmatize(token: &str) -> String {
    match reduce(token) {
        Some(base) if base.len() > 2 && !is_stopword(&base) => base,
        _ => token.to_string(),
    }
}

fn reduce(token: &str) -> Option<String> {
    if let Some(base) = irregular(token) {
        return Some(base.to_string());
    }
    if INVARIANT.contains(&token) {
        return None;
    }
    if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
        return None;
    }

    if let Some(stem) = token.strip_suffix('s').filter(|stem| IE_NOUNS.contains(stem)) {
        return Some(stem.to_string());
    }

    if let Some(stem) = token.strip_suffix("ies") {
        return Some(if token.len() > 4 {
            format!("{stem}y")
        } else {
            format!("{stem}ie")
        });
    }

    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if token.ends_with(suffix) {
            return Some(token[..token.len() - 2].to_string());
        }
    }

    token.strip_suffix('s').map(|stem| match irregular(stem) {
        Some(base) => base.to_string(),
        None => stem.to_string(),
    })
}

fn irregular(token: &str) -> Option<&'static str> {
    IRREGULAR
        .iter()
        .find(|(plural, _)| *plural == token)
        .map(|(_, base)| *base)
}
