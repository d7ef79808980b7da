//! Title tokenization and question normalization.
//!
//! The topic fingerprint is the set of significant terms left after
//! lowercasing a title, trimming edge punctuation from each word, and
//! dropping stop-words and short terms. The policy is deliberately dumb and
//! exact — novelty is decided by set membership, never by similarity.

use std::collections::BTreeSet;

/// Words carrying no topical signal in forum titles.
const STOPWORDS: &[&str] = &[
    "the", "is", "a", "an", "my", "i", "me", "we", "our", "you", "your", "it", "its", "this",
    "that", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "from", "by", "as",
    "be", "was", "were", "been", "am", "are", "do", "does", "did", "have", "has", "had", "will",
    "would", "could", "should", "can", "may", "might", "not", "no", "so", "if", "then", "just",
    "also", "very", "really", "about", "all", "any", "some", "what", "when", "how", "who", "which",
    "there", "here", "more", "other", "than", "too", "only", "after", "before", "now", "into",
    "over", "up", "out", "like", "im", "ive", "dont", "cant", "get", "got", "going", "still",
    "even",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Extract the significant terms from one post title.
///
/// Lowercases, splits on whitespace, trims non-alphanumeric characters from
/// each word's edges, then drops stop-words and words shorter than
/// `min_term_len`.
#[must_use]
pub fn title_terms(title: &str, min_term_len: usize) -> BTreeSet<String> {
    title
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| word.chars().count() >= min_term_len && !is_stopword(word))
        .collect()
}

/// Build the week's topic fingerprint from all forum post titles.
#[must_use]
pub fn topic_fingerprint<'a, I>(titles: I, min_term_len: usize) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut fingerprint = BTreeSet::new();
    for title in titles {
        fingerprint.extend(title_terms(title, min_term_len));
    }
    fingerprint
}

/// Normalize a question string for set-difference comparison.
///
/// Lowercases, removes everything that is not alphanumeric or whitespace
/// (so "what's" and "whats" compare equal), and collapses runs of
/// whitespace to single spaces. The surfaced question text keeps its
/// original casing; only membership checks use this form.
#[must_use]
pub fn normalize_question(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_terms_drops_stopwords_and_short_words() {
        let terms = title_terms("How do I fix my dowager hump at 30?", 3);
        assert_eq!(
            terms,
            BTreeSet::from(["fix".to_string(), "dowager".to_string(), "hump".to_string()])
        );
    }

    #[test]
    fn title_terms_trims_edge_punctuation() {
        let terms = title_terms("Sciatica?! (again...)", 3);
        assert_eq!(
            terms,
            BTreeSet::from(["sciatica".to_string(), "again".to_string()])
        );
    }

    #[test]
    fn title_terms_empty_title() {
        assert!(title_terms("", 3).is_empty());
        assert!(title_terms("   ", 3).is_empty());
    }

    #[test]
    fn min_term_len_is_respected() {
        // "rsi" survives at 3 but not at 4.
        assert!(title_terms("rsi flare", 3).contains("rsi"));
        assert!(!title_terms("rsi flare", 4).contains("rsi"));
    }

    #[test]
    fn fingerprint_unions_across_titles() {
        let fingerprint = topic_fingerprint(
            ["sciatica stretches", "posture brace review"].into_iter(),
            3,
        );
        assert_eq!(fingerprint.len(), 5);
        assert!(fingerprint.contains("sciatica"));
        assert!(fingerprint.contains("brace"));
    }

    #[test]
    fn normalize_question_strips_punctuation_and_case() {
        assert_eq!(
            normalize_question("What's the BEST stretch for sciatica?"),
            "whats the best stretch for sciatica"
        );
        assert_eq!(
            normalize_question("whats the best stretch for Sciatica"),
            "whats the best stretch for sciatica"
        );
    }

    #[test]
    fn normalize_question_collapses_whitespace() {
        assert_eq!(normalize_question("  a   b\t c  "), "a b c");
    }
}
