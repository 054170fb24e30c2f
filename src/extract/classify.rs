//! Confidence-language and category classification.

use crate::config::Config;
use crate::domain::{Category, ConfidenceLanguage};
use crate::text;

/// Whole-word (or whole-phrase) keyword presence over normalized text.
///
/// Single-word keywords match against the token set; multi-word keywords
/// match as a space-bounded substring of the normalized sentence.
pub fn keyword_present(normalized: &str, keyword: &str) -> bool {
    let needle = text::normalize(keyword);
    if needle.is_empty() {
        return false;
    }
    let padded = format!(" {} ", normalized);
    padded.contains(&format!(" {} ", needle))
}

/// Classify hedged / definitive / unknown.
///
/// A hedge marker anywhere wins; otherwise an assertion verb with a definite
/// subject reads as definitive.
pub fn classify_confidence(
    sentence: &str,
    has_assertion_verb: bool,
    has_anchor: bool,
    config: &Config,
) -> ConfidenceLanguage {
    let normalized = text::normalize(sentence);
    let hedged = config
        .hedge_words
        .iter()
        .any(|h| keyword_present(&normalized, h));
    if hedged {
        return ConfidenceLanguage::Hedged;
    }
    if has_assertion_verb && has_anchor {
        return ConfidenceLanguage::Definitive;
    }
    ConfidenceLanguage::Unknown
}

/// Classify the topic category by keyword counting.
///
/// Score is the number of distinct category keywords present. The highest
/// score wins; ties break on the fixed priority order of [`Category::ALL`];
/// a zero score falls back to `general`. Returns the category and the
/// matched keywords for the signal log.
pub fn classify_category(sentence: &str, config: &Config) -> (Category, Vec<String>) {
    let normalized = text::normalize(sentence);

    let mut best = (Category::General, Vec::new());
    let mut best_score = 0usize;

    for category in Category::ALL {
        let matched: Vec<String> = config
            .keywords_for(category)
            .iter()
            .filter(|kw| keyword_present(&normalized, kw))
            .cloned()
            .collect();
        // Strictly-greater keeps the earlier (higher-priority) category on ties.
        if matched.len() > best_score {
            best_score = matched.len();
            best = (category, matched);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn test_hedged() {
        let c = config();
        assert_eq!(
            classify_confidence("This might cause a recession.", true, true, &c),
            ConfidenceLanguage::Hedged
        );
        assert_eq!(
            classify_confidence("Inflation is reportedly slowing.", true, true, &c),
            ConfidenceLanguage::Hedged
        );
    }

    #[test]
    fn test_hedge_phrase() {
        let c = config();
        assert_eq!(
            classify_confidence("Some say the numbers were inflated.", true, true, &c),
            ConfidenceLanguage::Hedged
        );
    }

    #[test]
    fn test_definitive() {
        let c = config();
        assert_eq!(
            classify_confidence("Alphabet reported revenue of $96.5 billion.", true, true, &c),
            ConfidenceLanguage::Definitive
        );
    }

    #[test]
    fn test_unknown_without_verb() {
        let c = config();
        assert_eq!(
            classify_confidence("A remarkable outcome for everyone involved.", false, true, &c),
            ConfidenceLanguage::Unknown
        );
    }

    #[test]
    fn test_category_finance() {
        let (cat, matched) =
            classify_category("Alphabet reported revenue of $96.5 billion in Q4 2024.", &config());
        assert_eq!(cat, Category::Finance);
        assert!(matched.iter().any(|k| k == "revenue"));
    }

    #[test]
    fn test_category_health() {
        let (cat, matched) = classify_category(
            "LDL cholesterol levels above 160 mg/dL are associated with cardiovascular risk.",
            &config(),
        );
        assert_eq!(cat, Category::Health);
        assert!(matched.iter().any(|k| k == "ldl"));
    }

    #[test]
    fn test_category_tech() {
        let (cat, _) = classify_category(
            "Nvidia announced a new GPU chip for AI training workloads.",
            &config(),
        );
        assert_eq!(cat, Category::Tech);
    }

    #[test]
    fn test_category_general_fallback() {
        let (cat, matched) = classify_category("Something happened somewhere yesterday.", &config());
        assert_eq!(cat, Category::General);
        assert!(matched.is_empty());
    }

    #[test]
    fn test_keyword_whole_word_only() {
        // "rate" must not match inside "pirate".
        assert!(!keyword_present(&text::normalize("the pirate ship"), "rate"));
        assert!(keyword_present(&text::normalize("the rate rose"), "rate"));
    }

    #[test]
    fn test_multiword_keyword() {
        let normalized = text::normalize("the federal reserve held steady");
        assert!(keyword_present(&normalized, "federal reserve"));
    }
}
