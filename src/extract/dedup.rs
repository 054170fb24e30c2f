//! Local claim deduplication.
//!
//! Exact dedup compares content hashes; fuzzy dedup compares token-ratio
//! similarity (LCS over normalized tokens / longer length) against the
//! configured threshold. Both operate within a single source only — the
//! aggregator, not the deduper, relates claims across sources.

use std::collections::HashSet;

use crate::text;

/// Tracks claims already kept for one source.
pub struct LocalDeduper {
    threshold: f64,
    seen_hashes: HashSet<String>,
    kept_tokens: Vec<Vec<String>>,
}

impl LocalDeduper {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            seen_hashes: HashSet::new(),
            kept_tokens: Vec::new(),
        }
    }

    /// Check a candidate and record it if kept. Returns `true` when the
    /// candidate duplicates an earlier claim (exactly or fuzzily).
    pub fn is_duplicate(&mut self, claim_text: &str) -> bool {
        let hash = text::content_hash(claim_text);
        if self.seen_hashes.contains(&hash) {
            return true;
        }

        let tokens = text::normalized_tokens(claim_text);
        for prev in &self.kept_tokens {
            if text::token_similarity(&tokens, prev) >= self.threshold {
                return true;
            }
        }

        self.seen_hashes.insert(hash);
        self.kept_tokens.push(tokens);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_duplicate_rejected() {
        let mut dedup = LocalDeduper::new(0.85);
        assert!(!dedup.is_duplicate("Inflation dropped to 2.3 percent in March."));
        assert!(dedup.is_duplicate("Inflation dropped to 2.3 percent in March."));
    }

    #[test]
    fn test_case_and_punctuation_duplicate() {
        let mut dedup = LocalDeduper::new(0.85);
        assert!(!dedup.is_duplicate("Inflation dropped to 2.3 percent in March."));
        assert!(dedup.is_duplicate("inflation dropped to 2.3 percent in march"));
    }

    #[test]
    fn test_near_duplicate_rejected() {
        let mut dedup = LocalDeduper::new(0.85);
        assert!(!dedup.is_duplicate("The Fed cut interest rates by 25 basis points on Wednesday."));
        assert!(dedup.is_duplicate("The Fed cut interest rates by 25 basis points on Wednesday again."));
    }

    #[test]
    fn test_distinct_kept() {
        let mut dedup = LocalDeduper::new(0.85);
        assert!(!dedup.is_duplicate("The Fed cut rates by 25 basis points."));
        assert!(!dedup.is_duplicate("Unemployment hit a record low of 3.5 percent."));
    }

    #[test]
    fn test_threshold_boundary() {
        // 17 of 20 tokens shared = 0.85 exactly → duplicate; 16/20 = 0.80 → kept.
        let base: Vec<String> = (0..20).map(|i| format!("tok{}", i)).collect();
        let mut below = base.clone();
        for slot in below.iter_mut().take(4) {
            *slot = format!("{}x", slot);
        }
        let mut at = base.clone();
        for slot in at.iter_mut().take(3) {
            *slot = format!("{}x", slot);
        }

        let mut dedup = LocalDeduper::new(0.85);
        assert!(!dedup.is_duplicate(&base.join(" ")));
        assert!(!dedup.is_duplicate(&below.join(" ")));
        assert!(dedup.is_duplicate(&at.join(" ")));
    }
}
