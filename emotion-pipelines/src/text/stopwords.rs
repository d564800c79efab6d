use std::collections::HashSet;
use std::sync::LazyLock;

/// Words that flip polarity. They survive stopword removal no matter what.
pub const NEGATIONS: [&str; 12] = [
    "not", "no", "never", "neither", "nobody", "nothing", "nowhere", "hardly", "barely",
    "scarcely", "rarely", "seldom",
];

// Standard English stopword corpus (179 entries).
const ENGLISH: [&str; 179] = [
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
    "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
    "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
    "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
    "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just", "don",
    "don't", "should", "should've", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain",
    "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn", "doesn't", "hadn",
    "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma", "mightn",
    "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't", "shouldn",
    "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    ENGLISH
        .iter()
        .copied()
        .filter(|word| !NEGATIONS.contains(word))
        .collect()
});

/// True when `token` should be dropped. Negations are never stopwords.
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negations_are_exempt() {
        for word in NEGATIONS {
            assert!(!is_stopword(word), "{word} must survive");
        }
    }

    #[test]
    fn common_function_words_are_stopwords() {
        for word in ["the", "am", "i", "so", "very", "because"] {
            assert!(is_stopword(word));
        }
        assert!(!is_stopword("happy"));
    }
}
