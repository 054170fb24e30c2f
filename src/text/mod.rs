//! Tokenization, normalization, and hashing primitives.
//!
//! Everything in this module is a pure function over text: no clocks, no
//! randomness, no shared state. All hashes and fuzzy comparisons in the
//! engine consume [`normalize`] output, never raw text.

pub mod dates;
pub mod entities;
pub mod numbers;

use std::collections::HashSet;

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

/// A word token with its byte offsets into the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split text on word boundaries, preserving byte offsets.
///
/// A token is a run of alphanumeric characters; apostrophes inside a word
/// are kept so contractions stay whole.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        let is_word = c.is_alphanumeric() || (c == '\'' && start.is_some());
        match (is_word, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                tokens.push(Token {
                    text: &text[s..i],
                    start: s,
                    end: i,
                });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            text: &text[s..],
            start: s,
            end: text.len(),
        });
    }
    tokens
}

/// Articles stripped from the front of normalized text.
const LEADING_ARTICLES: [&str; 3] = ["the", "a", "an"];

/// Hash-stable normalization.
///
/// Lowercase, drop every character that is not alphanumeric or whitespace,
/// collapse whitespace, and strip leading articles. Trailing punctuation
/// falls out of the alphanumeric filter. All content hashes and fuzzy
/// comparisons consume this output.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    while let Some(first) = words.first() {
        if LEADING_ARTICLES.contains(first) {
            words.remove(0);
        } else {
            break;
        }
    }
    words.join(" ")
}

/// SHA-256 hex digest of normalized text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize(text).as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalized word list (used by similarity and n-gram matching).
pub fn normalized_tokens(text: &str) -> Vec<String> {
    normalize(text).split_whitespace().map(String::from).collect()
}

/// Common English function words with no value for fact matching.
pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
        "do", "does", "did", "will", "would", "could", "should", "may", "might", "can", "shall",
        "not", "no", "in", "on", "at", "to", "for", "of", "with", "by", "from", "as", "or", "and",
        "but", "if", "so", "than", "then", "that", "this", "it", "its", "their", "there", "about",
        "also", "just", "more", "into", "between", "through", "during", "before", "after",
    ]
    .into_iter()
    .collect()
});

/// Minimal suffix stemmer, applied symmetrically on both sides of a
/// comparison so inflection differences ("reported" vs "reports") still
/// match. Not a linguistic stemmer.
pub fn stem(word: &str) -> String {
    let w = word;
    if w.len() > 5 && w.ends_with("ing") {
        return w[..w.len() - 3].to_string();
    }
    if w.len() > 4 && w.ends_with("ies") {
        return format!("{}y", &w[..w.len() - 3]);
    }
    if w.len() > 4 && w.ends_with("ed") {
        return w[..w.len() - 2].to_string();
    }
    if w.len() > 3 && w.ends_with('s') && !w.ends_with("ss") {
        return w[..w.len() - 1].to_string();
    }
    w.to_string()
}

/// Stopword-filtered, stemmed token set used for overlap scoring.
pub fn content_token_set(text: &str) -> HashSet<String> {
    normalized_tokens(text)
        .iter()
        .filter(|t| !STOPWORDS.contains(t.as_str()))
        .map(|t| stem(t))
        .collect()
}

/// Token-ratio similarity: longest common subsequence over normalized
/// tokens, divided by the longer token count. Returns 0.0..=1.0.
pub fn token_similarity(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let lcs = lcs_len(a, b);
    lcs as f64 / a.len().max(b.len()) as f64
}

fn lcs_len(a: &[String], b: &[String]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ai in a {
        for (j, bj) in b.iter().enumerate() {
            curr[j + 1] = if ai == bj {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Length of the longest contiguous n-gram of `needle` appearing in
/// `haystack`, considering only n-grams of at least `min_n` tokens.
/// Returns the n-gram length and its text, or `None`.
pub fn longest_common_ngram(
    needle: &[String],
    haystack: &[String],
    min_n: usize,
) -> Option<(usize, String)> {
    if needle.len() < min_n || haystack.is_empty() {
        return None;
    }
    // Try the longest window first so the first hit is the answer.
    for n in (min_n..=needle.len()).rev() {
        for window in needle.windows(n) {
            if haystack.windows(n).any(|h| h == window) {
                return Some((n, window.join(" ")));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_offsets() {
        let tokens = tokenize("GDP grew 2.8% in 2024.");
        assert_eq!(tokens[0].text, "GDP");
        assert_eq!(tokens[0].start, 0);
        assert_eq!(tokens[1].text, "grew");
        assert!(tokens.iter().any(|t| t.text == "2024"));
    }

    #[test]
    fn test_tokenize_keeps_contractions() {
        let tokens = tokenize("it doesn't matter");
        assert_eq!(tokens[1].text, "doesn't");
    }

    #[test]
    fn test_normalize_case_and_punctuation() {
        assert_eq!(normalize("The Fed, Announced!"), "fed announced");
        assert_eq!(normalize("  GDP   grew  2.8%. "), "gdp grew 28");
    }

    #[test]
    fn test_normalize_strips_leading_articles() {
        assert_eq!(normalize("The deficit grew."), "deficit grew");
        assert_eq!(normalize("An apple a day"), "apple a day");
    }

    #[test]
    fn test_content_hash_stability() {
        // Whitespace, case, trailing punctuation, leading articles.
        let h = content_hash("The Fed announced a rate cut.");
        assert_eq!(h, content_hash("  the fed  announced a rate cut  "));
        assert_eq!(h, content_hash("Fed announced a rate cut!!!"));
        assert_eq!(h.len(), 64);
    }

    #[test]
    fn test_content_hash_differs_on_content() {
        assert_ne!(
            content_hash("Inflation is at 3 percent."),
            content_hash("Inflation is at 4 percent.")
        );
    }

    #[test]
    fn test_stem_symmetry() {
        assert_eq!(stem("reported"), stem("reports"));
        assert_eq!(stem("announces"), stem("announced"));
        assert_eq!(stem("studies"), "study");
    }

    #[test]
    fn test_token_similarity_identical() {
        let a = normalized_tokens("Inflation dropped to 2.3 percent in March");
        let b = normalized_tokens("Inflation dropped to 2.3 percent in march.");
        assert!(token_similarity(&a, &b) > 0.99);
    }

    #[test]
    fn test_token_similarity_distinct() {
        let a = normalized_tokens("The Fed cut rates by 25 basis points");
        let b = normalized_tokens("Unemployment hit a record low of 3.5 percent");
        assert!(token_similarity(&a, &b) < 0.3);
    }

    #[test]
    fn test_longest_common_ngram() {
        let claim = normalized_tokens("Alphabet reported revenue of 96.5 billion dollars");
        let cand = normalized_tokens("Form 10-K: Alphabet reported revenue of 96.5 billion for the year");
        let (n, phrase) = longest_common_ngram(&claim, &cand, 3).unwrap();
        assert!(n >= 5);
        assert!(phrase.contains("reported revenue"));
    }

    #[test]
    fn test_longest_common_ngram_none_below_min() {
        let claim = normalized_tokens("GDP grew fast");
        let cand = normalized_tokens("unrelated words entirely here");
        assert!(longest_common_ngram(&claim, &cand, 3).is_none());
    }
}
