//! Deterministic claim extraction from transcript segments.
//!
//! No LLM involved — rule-based heuristics end to end:
//!   1. Stitch segments into text windows so sentences are complete.
//!   2. Split windows into sentences at punctuation boundaries.
//!   3. Keep sentences with a claim signal (number, date, entity, assertion
//!      verb) AND a subject-like anchor.
//!   4. Reject dangling clauses, boilerplate, and bare questions.
//!   5. Classify confidence language and topic category.
//!   6. Deduplicate exactly (content hash) and fuzzily (token similarity).
//!
//! Given identical segments and lexicons the output is byte-identical:
//! claim ids are derived from the content hash, not generated randomly.

pub mod classify;
pub mod dedup;
pub mod sentences;
pub mod stitch;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::Config;
use crate::domain::{Claim, ClaimStatus, ConfidenceLanguage, TimedSegment};
use crate::text::{self, dates, entities, numbers};

use dedup::LocalDeduper;

/// Shortest acceptable claim, in whitespace-separated words.
pub const MIN_CLAIM_WORDS: usize = 7;
/// Shortest acceptable claim, in characters.
pub const MIN_CLAIM_CHARS: usize = 40;
/// Longest acceptable claim; longer sentences are rejected, not trimmed.
pub const MAX_CLAIM_CHARS: usize = 240;

/// Malformed input segments. The whole source fails; no partial claims.
#[derive(Debug, Clone, Error)]
pub enum InputError {
    #[error("source has no usable segments")]
    Empty,

    #[error("segments out of order at index {0}")]
    OutOfOrder(usize),

    #[error("segments overlap at index {0}")]
    Overlapping(usize),
}

/// Deterministic claim id: first 12 hex chars of
/// sha256(source_id + ":" + content_hash). Re-extraction of the same source
/// reproduces the same ids.
pub fn claim_id(source_id: &str, content_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_id.as_bytes());
    hasher.update(b":");
    hasher.update(content_hash.as_bytes());
    hex::encode(&hasher.finalize()[..6])
}

/// How the subject-anchor rule was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Proper,
    Pronoun,
    Number,
}

impl Anchor {
    fn tag(&self) -> &'static str {
        match self {
            Anchor::Proper => "anchor:proper",
            Anchor::Pronoun => "anchor:pronoun",
            Anchor::Number => "anchor:number",
        }
    }
}

/// Rule-based claim extractor. Pure and synchronous; all state is the
/// read-only config.
pub struct ClaimExtractor<'a> {
    config: &'a Config,
}

impl<'a> ClaimExtractor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Extract ordered claims from ordered segments.
    pub fn extract(
        &self,
        source_id: &str,
        segments: &[TimedSegment],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<Claim>, InputError> {
        validate_segments(segments)?;

        let mut claims = Vec::new();
        let mut deduper = LocalDeduper::new(self.config.dedup_threshold);

        for window in stitch::stitch(segments) {
            let window_len = window.text.len().max(1);
            let duration = window.end_s - window.start_s;

            for sentence in sentences::split(&window.text, &self.config.abbreviations) {
                let Some(candidate) = self.evaluate(&sentence.text) else {
                    continue;
                };
                if deduper.is_duplicate(&sentence.text) {
                    continue;
                }

                let frac_start = sentence.start as f64 / window_len as f64;
                let frac_end = sentence.end as f64 / window_len as f64;
                let content_hash = text::content_hash(&sentence.text);
                // Same normalization on purpose: the local dedup key is
                // (source_id, content_hash), the global index is the bare hash.
                let global_hash = content_hash.clone();

                claims.push(Claim {
                    id: claim_id(source_id, &content_hash),
                    source_id: source_id.to_string(),
                    text: sentence.text.clone(),
                    start_s: round3(window.start_s + duration * frac_start),
                    end_s: round3(window.start_s + duration * frac_end),
                    content_hash,
                    global_hash,
                    confidence_language: candidate.confidence,
                    category: candidate.category,
                    signal_log: candidate.signal_log,
                    status: ClaimStatus::Unknown,
                    created_at,
                });
            }
        }

        Ok(claims)
    }

    /// Run every filter and detector over one sentence. Returns `None` when
    /// any gate rejects it.
    fn evaluate(&self, sentence: &str) -> Option<CandidateClaim> {
        // Length gate. Over-length sentences are rejected outright.
        let word_count = sentence.split_whitespace().count();
        if word_count < MIN_CLAIM_WORDS
            || sentence.len() < MIN_CLAIM_CHARS
            || sentence.len() > MAX_CLAIM_CHARS
        {
            return None;
        }

        // Dangling clause: leading conjunction.
        let first_word = sentence
            .split_whitespace()
            .next()
            .map(|w| w.trim_end_matches(',').to_lowercase())
            .unwrap_or_default();
        if self.config.leading_conjunctions.contains(&first_word) {
            return None;
        }

        // Boilerplate: case-insensitive substring.
        let lower = sentence.to_lowercase();
        if self.config.boilerplate.iter().any(|b| lower.contains(b)) {
            return None;
        }

        // A bare question is not a claim.
        if sentence.trim_end().ends_with('?') {
            return None;
        }

        // Signal detectors.
        let date_mentions = dates::detect(sentence);
        let number_mentions = numbers::detect_significant(sentence, &date_mentions);
        let entity_mentions = entities::detect(sentence, &self.config.entity_allowlist);
        let assertion_verb = sentence
            .split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .find(|w| self.config.assertion_verbs.contains(w));

        let has_signal = !number_mentions.is_empty()
            || !date_mentions.is_empty()
            || !entity_mentions.is_empty()
            || assertion_verb.is_some();
        if !has_signal {
            return None;
        }

        let anchor = self.find_anchor(sentence, &entity_mentions)?;

        let confidence = classify::classify_confidence(
            sentence,
            assertion_verb.is_some(),
            true,
            self.config,
        );
        let (category, matched_keywords) = classify::classify_category(sentence, self.config);

        // Explainability log, in fixed signal order.
        let mut signal_log = Vec::new();
        for n in number_mentions.iter().take(3) {
            signal_log.push(format!("num={}", n.canonical_string()));
            if let Some(unit) = &n.unit {
                if unit == "USD" || unit == "EUR" || unit == "GBP" {
                    signal_log.push(format!("currency={}", unit));
                } else {
                    signal_log.push(format!("unit={}", unit));
                }
            }
        }
        for d in date_mentions.iter().take(2) {
            signal_log.push(format!("date={}", d.surface));
        }
        for e in entity_mentions.iter().take(3) {
            signal_log.push(format!("entity:{}={}", e.kind.as_str(), e.text));
        }
        if let Some(verb) = &assertion_verb {
            signal_log.push(format!("verb:assert={}", verb));
        }
        signal_log.push(anchor.tag().to_string());
        match confidence {
            ConfidenceLanguage::Hedged => signal_log.push("confidence:hedged".to_string()),
            ConfidenceLanguage::Definitive => signal_log.push("confidence:definitive".to_string()),
            ConfidenceLanguage::Unknown => {}
        }
        if category != crate::domain::Category::General {
            signal_log.push(format!("category:{}", category.as_str()));
            for kw in matched_keywords.iter().take(3) {
                signal_log.push(format!("{}_term={}", category.as_str(), kw));
            }
        }

        Some(CandidateClaim {
            confidence,
            category,
            signal_log,
        })
    }

    /// Subject-like anchor: a proper noun in the first 40% of the sentence,
    /// a subject pronoun at sentence start, or a leading number.
    fn find_anchor(
        &self,
        sentence: &str,
        entity_mentions: &[entities::EntityMention],
    ) -> Option<Anchor> {
        let cutoff = (sentence.len() as f64 * 0.4) as usize;
        if entity_mentions.iter().any(|e| e.start <= cutoff) {
            return Some(Anchor::Proper);
        }

        let first = sentence.split_whitespace().next()?;
        let first_clean = first
            .trim_matches(|c: char| !c.is_alphanumeric() && c != '$' && c != '€' && c != '£');
        if self
            .config
            .subject_pronouns
            .contains(&first_clean.to_lowercase())
        {
            return Some(Anchor::Pronoun);
        }
        if first_clean
            .chars()
            .next()
            .map(|c| c.is_ascii_digit() || c == '$' || c == '€' || c == '£')
            .unwrap_or(false)
        {
            return Some(Anchor::Number);
        }
        None
    }
}

struct CandidateClaim {
    confidence: ConfidenceLanguage,
    category: crate::domain::Category,
    signal_log: Vec<String>,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn validate_segments(segments: &[TimedSegment]) -> Result<(), InputError> {
    if segments.is_empty() || segments.iter().all(|s| s.text.trim().is_empty()) {
        return Err(InputError::Empty);
    }
    for (i, pair) in segments.windows(2).enumerate() {
        if pair[1].start_s < pair[0].start_s {
            return Err(InputError::OutOfOrder(i + 1));
        }
        if pair[1].start_s < pair[0].end_s {
            return Err(InputError::Overlapping(i + 1));
        }
    }
    Ok(())
}
