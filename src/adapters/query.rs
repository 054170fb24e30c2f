//! Search-query construction shared by the adapters.
//!
//! Multi-word proper nouns become quoted phrases, numbers are always kept,
//! stopwords are dropped, and the result is capped at a handful of terms —
//! structured APIs match far better on a few precise terms than on the
//! whole sentence.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use super::FetchRequest;

/// Phrases too common to help a search.
static COMMON_PHRASES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "United States",
        "New York",
        "Last Year",
        "Next Year",
        "First Quarter",
        "Second Quarter",
        "Third Quarter",
        "Fourth Quarter",
    ]
    .into_iter()
    .collect()
});

static QUERY_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "is", "are", "was", "were", "has", "have", "had", "be", "been", "being",
        "do", "does", "did", "will", "would", "could", "should", "may", "might", "shall", "can",
        "to", "of", "in", "for", "on", "at", "by", "with", "from", "as", "into", "about",
        "between", "through", "during", "before", "after", "and", "but", "or", "so", "if", "then",
        "than", "that", "this", "these", "those", "it", "its", "not", "no", "just", "very",
        "really", "also", "too", "more", "most", "some", "any", "all", "each", "every", "both",
        "according",
    ]
    .into_iter()
    .collect()
});

/// Build a search query from a fetch request. `max_terms` bounds the result;
/// each quoted phrase counts as two terms.
pub fn build_search_query(request: &FetchRequest, max_terms: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut terms_used = 0usize;
    let mut phrase_words: HashSet<String> = HashSet::new();

    // Quoted multi-word entities first, strongest signal for structured APIs.
    for entity in request.entities.iter().take(3) {
        if !entity.contains(' ') || COMMON_PHRASES.contains(entity.as_str()) {
            continue;
        }
        parts.push(format!("\"{}\"", entity));
        for word in entity.split_whitespace() {
            phrase_words.insert(word.to_lowercase());
        }
        terms_used += 2;
        if terms_used + 2 > max_terms {
            break;
        }
    }

    // Then remaining informative tokens: numbers, capitalized words, plain terms.
    for word in request.claim_text.split_whitespace() {
        if terms_used >= max_terms {
            break;
        }
        let cleaned = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '.' && c != '$');
        if cleaned.is_empty() {
            continue;
        }
        let lower = cleaned.to_lowercase();
        if phrase_words.contains(&lower) {
            continue;
        }
        let keep = cleaned.chars().any(|c| c.is_ascii_digit())
            || (cleaned.chars().next().is_some_and(|c| c.is_uppercase())
                && !QUERY_STOPWORDS.contains(lower.as_str()))
            || (!QUERY_STOPWORDS.contains(lower.as_str()) && lower.len() > 2);
        if keep {
            parts.push(if cleaned.chars().any(|c| c.is_ascii_digit()) {
                cleaned.trim_matches('$').trim_end_matches('.').to_string()
            } else {
                lower
            });
            terms_used += 1;
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::Category;

    fn request(text: &str) -> FetchRequest {
        FetchRequest::from_claim(text, Category::Finance, &Config::default())
    }

    #[test]
    fn test_multiword_entity_quoted() {
        let q = build_search_query(
            &request("The report from Goldman Sachs projected higher yields this cycle."),
            8,
        );
        assert!(q.contains("\"Goldman Sachs\""));
    }

    #[test]
    fn test_numbers_kept() {
        let q = build_search_query(
            &request("Alphabet reported revenue of $96.5 billion in Q4 2024."),
            8,
        );
        assert!(q.contains("96.5"));
        assert!(q.contains("alphabet") || q.contains("Alphabet"));
    }

    #[test]
    fn test_stopwords_dropped() {
        let q = build_search_query(
            &request("It was the most remarkable outcome of the entire decade."),
            8,
        );
        assert!(!q.split_whitespace().any(|w| w == "the" || w == "was"));
    }

    #[test]
    fn test_term_cap_respected() {
        let q = build_search_query(
            &request(
                "Alphabet reported revenue earnings margins dividends buybacks guidance capex payrolls inflation yields",
            ),
            6,
        );
        assert!(q.split_whitespace().count() <= 7); // quoted phrase may add one
    }
}
