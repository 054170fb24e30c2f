//! Rule-based evidence scoring and auto-status guardrails.
//!
//! Every signal is deterministic and its contribution is recorded in the
//! breakdown map, which always sums exactly to the final score. "Now" is an
//! explicit parameter (callers pass the source's `ingested_at`) so temporal
//! scoring is reproducible.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::domain::{Claim, ClaimStatus, EvidenceCandidate, ScoredEvidence};
use crate::text::{self, dates, numbers};

/// Weight caps per signal.
const TOKEN_OVERLAP_MAX: i32 = 20;
const ENTITY_MATCH_MAX: i32 = 20;
const NUMBER_MATCH: i32 = 25;
const NUMBER_UNIT_BONUS: i32 = 10;
const KEYPHRASE_MAX: i32 = 15;
const TEMPORAL_MAX: i32 = 10;
const STALE_PENALTY: i32 = -5;

/// Days within which a dated claim and evidence count as aligned.
const TEMPORAL_TIGHT_DAYS: i64 = 90;
/// Decay horizon: alignment reaches zero at three years.
const TEMPORAL_FAR_DAYS: i64 = 1095;

/// Minimum score for the SUPPORTED guardrail.
pub const SUPPORTED_MIN_SCORE: i32 = 85;
/// Minimum score for the PARTIAL guardrail.
pub const PARTIAL_MIN_SCORE: i32 = 70;

/// Evidence scorer. Pure; holds only the read-only config.
pub struct Scorer<'a> {
    config: &'a Config,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Score one candidate against a claim. `now` anchors relative claim
    /// dates; pass the source's ingestion time.
    pub fn score(
        &self,
        claim: &Claim,
        candidate: &EvidenceCandidate,
        now: DateTime<Utc>,
    ) -> ScoredEvidence {
        let mut breakdown: BTreeMap<String, i32> = BTreeMap::new();
        let candidate_text = format!("{} {}", candidate.title, candidate.snippet);

        // Degenerate candidate: empty text scores zero, no error.
        if candidate_text.trim().is_empty() {
            return ScoredEvidence {
                claim_id: claim.id.clone(),
                candidate: candidate.clone(),
                score: 0,
                breakdown,
                matched_keyphrase: None,
                matched_number: None,
            };
        }

        // 1. Token overlap: Jaccard of stemmed, stopword-filtered token sets.
        let claim_set = text::content_token_set(&claim.text);
        let cand_set = text::content_token_set(&candidate_text);
        let union = claim_set.union(&cand_set).count();
        let inter = claim_set.intersection(&cand_set).count();
        let token_overlap = if union == 0 {
            0
        } else {
            ((inter as f64 / union as f64) * TOKEN_OVERLAP_MAX as f64).round() as i32
        };
        breakdown.insert("token_overlap".to_string(), token_overlap);

        // 2. Entity match: fraction of claim entities present in candidate.
        let claim_entities =
            text::entities::detect(&claim.text, &self.config.entity_allowlist);
        let entity_match = if claim_entities.is_empty() {
            0
        } else {
            let cand_lower = candidate_text.to_lowercase();
            let matched = claim_entities
                .iter()
                .filter(|e| cand_lower.contains(&e.text.to_lowercase()))
                .count();
            ((matched as f64 / claim_entities.len() as f64) * ENTITY_MATCH_MAX as f64).round()
                as i32
        };
        breakdown.insert("entity_match".to_string(), entity_match);

        // 3. Number match: exact canonical equality, unit/scale bonus.
        let claim_dates = dates::detect(&claim.text);
        let claim_numbers = numbers::detect_significant(&claim.text, &claim_dates);
        let mut matched_number = None;
        let mut number_match = 0;
        'outer: for cn in &claim_numbers {
            for en in &candidate.numbers {
                if cn.value_eq(en) {
                    number_match = NUMBER_MATCH;
                    if cn.units_agree(en) {
                        number_match += NUMBER_UNIT_BONUS;
                    }
                    matched_number = Some(cn.value);
                    break 'outer;
                }
            }
        }
        breakdown.insert("number_match".to_string(), number_match);

        // 4. Keyphrase alignment: longest shared n-gram (n >= 3), normalized
        // by claim length.
        let claim_tokens = text::normalized_tokens(&claim.text);
        let cand_tokens = text::normalized_tokens(&candidate_text);
        let mut matched_keyphrase = None;
        let keyphrase = match text::longest_common_ngram(&claim_tokens, &cand_tokens, 3) {
            Some((n, phrase)) => {
                matched_keyphrase = Some(phrase);
                ((n as f64 / claim_tokens.len().max(1) as f64) * KEYPHRASE_MAX as f64).round()
                    as i32
            }
            None => 0,
        };
        breakdown.insert("keyphrase".to_string(), keyphrase);

        // 5. Evidence type weight from the per-category table.
        let type_weight = self
            .config
            .evidence_weight(claim.category, candidate.evidence_type);
        breakdown.insert("evidence_type".to_string(), type_weight);

        // 6. Temporal alignment.
        let temporal = self.temporal_score(claim, candidate, &claim_dates, now);
        breakdown.insert("temporal".to_string(), temporal);

        // Clamp to [0, 100] by adjusting the entries that overflowed, so the
        // breakdown still sums exactly to the score.
        let mut score: i32 = breakdown.values().sum();
        if score > 100 {
            let overflow = score - 100;
            if let Some(nm) = breakdown.get_mut("number_match") {
                *nm -= overflow.min(*nm);
            }
            score = breakdown.values().sum();
        }
        if score < 0 {
            if let Some(t) = breakdown.get_mut("temporal") {
                *t -= score; // raise the penalty entry back toward zero
            }
            score = breakdown.values().sum();
        }

        ScoredEvidence {
            claim_id: claim.id.clone(),
            candidate: candidate.clone(),
            score,
            breakdown,
            matched_keyphrase,
            matched_number,
        }
    }

    fn temporal_score(
        &self,
        claim: &Claim,
        candidate: &EvidenceCandidate,
        claim_dates: &[dates::DateMention],
        now: DateTime<Utc>,
    ) -> i32 {
        let Some(published) = candidate.published_at else {
            return 0;
        };
        let reference = now.date_naive();
        let Some(claim_date) = claim_dates
            .iter()
            .filter_map(|d| d.resolve_relative(reference))
            .next()
        else {
            return 0;
        };

        let delta = (claim_date - published).num_days().abs();
        if delta <= TEMPORAL_TIGHT_DAYS {
            TEMPORAL_MAX
        } else if delta <= TEMPORAL_FAR_DAYS {
            let span = (TEMPORAL_FAR_DAYS - TEMPORAL_TIGHT_DAYS) as f64;
            ((TEMPORAL_FAR_DAYS - delta) as f64 / span * TEMPORAL_MAX as f64).round() as i32
        } else if self.config.time_sensitive.contains(&claim.category) {
            STALE_PENALTY
        } else {
            0
        }
    }
}

/// Verdict for a single scored candidate, per the guardrails:
///
/// - SUPPORTED: score >= 85, primary source, and a number or keyphrase hit.
/// - PARTIAL: 70 <= score < 85 with an entity hit.
/// - UNKNOWN otherwise. CONTRADICTED is never produced here.
pub fn candidate_verdict(evidence: &ScoredEvidence) -> ClaimStatus {
    let number_hit = evidence
        .breakdown
        .get("number_match")
        .copied()
        .unwrap_or(0)
        > 0;
    let keyphrase_hit = evidence.breakdown.get("keyphrase").copied().unwrap_or(0) > 0;
    let entity_hit = evidence
        .breakdown
        .get("entity_match")
        .copied()
        .unwrap_or(0)
        > 0;

    if evidence.score >= SUPPORTED_MIN_SCORE
        && evidence.candidate.evidence_type.is_primary()
        && (number_hit || keyphrase_hit)
    {
        return ClaimStatus::Supported;
    }
    if evidence.score >= PARTIAL_MIN_SCORE && evidence.score < SUPPORTED_MIN_SCORE && entity_hit {
        return ClaimStatus::Partial;
    }
    ClaimStatus::Unknown
}

/// Auto-status for a claim: the highest-ranked verdict across its evidence.
/// A pure function of the evidence set; empty evidence means UNKNOWN.
pub fn auto_status(evidence: &[ScoredEvidence]) -> ClaimStatus {
    evidence
        .iter()
        .map(candidate_verdict)
        .max_by_key(|s| s.rank())
        .unwrap_or(ClaimStatus::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, ConfidenceLanguage, EvidenceType, SourceApi};
    use chrono::NaiveDate;

    fn claim(text: &str, category: Category) -> Claim {
        Claim {
            id: "c1".to_string(),
            source_id: "s1".to_string(),
            text: text.to_string(),
            start_s: 0.0,
            end_s: 5.0,
            content_hash: text::content_hash(text),
            global_hash: text::content_hash(text),
            confidence_language: ConfidenceLanguage::Definitive,
            category,
            signal_log: vec!["num=1".to_string()],
            status: ClaimStatus::Unknown,
            created_at: Utc::now(),
        }
    }

    fn candidate(
        title: &str,
        snippet: &str,
        source_api: SourceApi,
        evidence_type: EvidenceType,
        published: Option<NaiveDate>,
    ) -> EvidenceCandidate {
        EvidenceCandidate {
            source_api,
            evidence_type,
            title: title.to_string(),
            snippet: snippet.to_string(),
            url: format!("https://example.org/{}", source_api.as_str()),
            identifier: None,
            published_at: published,
            entities: Vec::new(),
            numbers: numbers::detect(&format!("{} {}", title, snippet)),
            keyphrases: Vec::new(),
        }
    }

    #[test]
    fn test_breakdown_sums_to_score() {
        let config = Config::default();
        let scorer = Scorer::new(&config);
        let c = claim(
            "Alphabet reported revenue of $96.5 billion in Q4 2024.",
            Category::Finance,
        );
        let cand = candidate(
            "Alphabet Inc. Form 10-K",
            "Alphabet reported revenue of $96.5 billion for the fourth quarter of 2024, up 12 percent.",
            SourceApi::SecEdgar,
            EvidenceType::Filing,
            NaiveDate::from_ymd_opt(2025, 1, 30),
        );
        let scored = scorer.score(&c, &cand, Utc::now());
        let sum: i32 = scored.breakdown.values().sum();
        assert_eq!(sum, scored.score);
        assert!(scored.score <= 100);
    }

    #[test]
    fn test_strong_filing_match_supported() {
        let config = Config::default();
        let scorer = Scorer::new(&config);
        let c = claim(
            "Alphabet reported revenue of $96.5 billion in Q4 2024.",
            Category::Finance,
        );
        let cand = candidate(
            "Alphabet Inc. Form 10-K annual report",
            "Alphabet reported revenue of $96.5 billion in Q4 2024, an increase over the prior year driven by advertising.",
            SourceApi::SecEdgar,
            EvidenceType::Filing,
            NaiveDate::from_ymd_opt(2025, 1, 30),
        );
        let scored = scorer.score(&c, &cand, Utc::now());
        assert!(scored.score >= SUPPORTED_MIN_SCORE, "score {}", scored.score);
        assert!(scored.matched_number.is_some());
        assert_eq!(candidate_verdict(&scored), ClaimStatus::Supported);
    }

    #[test]
    fn test_secondary_source_cannot_be_supported() {
        let config = Config::default();
        let scorer = Scorer::new(&config);
        let c = claim(
            "Alphabet reported revenue of $96.5 billion in Q4 2024.",
            Category::Finance,
        );
        // Same text quality, but a Wikipedia (secondary) candidate.
        let cand = candidate(
            "Alphabet Inc.",
            "Alphabet reported revenue of $96.5 billion in Q4 2024 according to its annual report.",
            SourceApi::Wikipedia,
            EvidenceType::Secondary,
            NaiveDate::from_ymd_opt(2025, 1, 30),
        );
        let scored = scorer.score(&c, &cand, Utc::now());
        assert_ne!(candidate_verdict(&scored), ClaimStatus::Supported);
    }

    #[test]
    fn test_weak_overlap_is_unknown() {
        let config = Config::default();
        let scorer = Scorer::new(&config);
        let c = claim(
            "Alphabet reported revenue of $96.5 billion in Q4 2024.",
            Category::Finance,
        );
        let cand = candidate(
            "Alphabet Inc.",
            "Alphabet is an American multinational technology conglomerate headquartered in Mountain View.",
            SourceApi::Wikipedia,
            EvidenceType::Secondary,
            None,
        );
        let scored = scorer.score(&c, &cand, Utc::now());
        assert!(scored.score < PARTIAL_MIN_SCORE);
        assert_eq!(candidate_verdict(&scored), ClaimStatus::Unknown);
    }

    #[test]
    fn test_empty_candidate_scores_zero() {
        let config = Config::default();
        let scorer = Scorer::new(&config);
        let c = claim("Alphabet reported revenue of $96.5 billion.", Category::Finance);
        let cand = candidate("", "", SourceApi::Wikipedia, EvidenceType::Secondary, None);
        let scored = scorer.score(&c, &cand, Utc::now());
        assert_eq!(scored.score, 0);
        assert_eq!(candidate_verdict(&scored), ClaimStatus::Unknown);
    }

    #[test]
    fn test_auto_status_takes_best_verdict() {
        let config = Config::default();
        let scorer = Scorer::new(&config);
        let c = claim(
            "Alphabet reported revenue of $96.5 billion in Q4 2024.",
            Category::Finance,
        );
        let weak = scorer.score(
            &c,
            &candidate("Alphabet Inc.", "A company overview.", SourceApi::Wikipedia, EvidenceType::Secondary, None),
            Utc::now(),
        );
        let strong = scorer.score(
            &c,
            &candidate(
                "Alphabet Inc. Form 10-K annual report",
                "Alphabet reported revenue of $96.5 billion in Q4 2024, up from the prior year on advertising strength.",
                SourceApi::SecEdgar,
                EvidenceType::Filing,
                NaiveDate::from_ymd_opt(2025, 1, 30),
            ),
            Utc::now(),
        );
        assert_eq!(auto_status(&[weak, strong]), ClaimStatus::Supported);
    }

    #[test]
    fn test_auto_status_empty_is_unknown() {
        assert_eq!(auto_status(&[]), ClaimStatus::Unknown);
    }

    #[test]
    fn test_auto_status_never_contradicted() {
        let config = Config::default();
        let scorer = Scorer::new(&config);
        let c = claim("Alphabet reported revenue of $96.5 billion.", Category::Finance);
        let scored = scorer.score(
            &c,
            &candidate(
                "Completely unrelated paper about bird migration",
                "Migration patterns shifted across decades of observation.",
                SourceApi::Crossref,
                EvidenceType::Paper,
                None,
            ),
            Utc::now(),
        );
        assert_ne!(candidate_verdict(&scored), ClaimStatus::Contradicted);
    }

    #[test]
    fn test_temporal_decay() {
        let config = Config::default();
        let scorer = Scorer::new(&config);
        let c = claim(
            "Alphabet reported revenue of $96.5 billion in Q4 2024.",
            Category::Finance,
        );
        let near = scorer.score(
            &c,
            &candidate(
                "Alphabet Form 10-K",
                "Revenue of $96.5 billion reported.",
                SourceApi::SecEdgar,
                EvidenceType::Filing,
                NaiveDate::from_ymd_opt(2025, 1, 15),
            ),
            Utc::now(),
        );
        let stale = scorer.score(
            &c,
            &candidate(
                "Alphabet Form 10-K",
                "Revenue of $96.5 billion reported.",
                SourceApi::SecEdgar,
                EvidenceType::Filing,
                NaiveDate::from_ymd_opt(2015, 1, 15),
            ),
            Utc::now(),
        );
        assert!(near.breakdown["temporal"] > stale.breakdown["temporal"]);
        assert_eq!(stale.breakdown["temporal"], STALE_PENALTY);
    }

    #[test]
    fn test_breakdown_clamped_sum_still_matches() {
        let config = Config::default();
        let scorer = Scorer::new(&config);
        // Claim and candidate identical: every signal maxes out.
        let text = "Alphabet reported revenue of $96.5 billion in Q4 2024.";
        let c = claim(text, Category::Finance);
        let cand = candidate(
            text,
            text,
            SourceApi::SecEdgar,
            EvidenceType::Filing,
            NaiveDate::from_ymd_opt(2024, 11, 20),
        );
        let scored = scorer.score(&c, &cand, Utc::now());
        assert!(scored.score <= 100);
        let sum: i32 = scored.breakdown.values().sum();
        assert_eq!(sum, scored.score);
    }
}
