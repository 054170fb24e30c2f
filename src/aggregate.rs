//! Cross-source aggregation: spread, timelines, top claims, and
//! contradiction flags.
//!
//! Claims sharing a global hash collapse into one group; near-duplicates
//! (token similarity >= threshold) merge within sliding (ISO week,
//! category) windows via union-find. Groups are computed, never stored on
//! claims, and contradiction flags are advisory — no status is mutated.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::domain::{Category, Claim};
use crate::text::{self, entities, numbers};

/// A claim plus the ingestion time of its source, the aggregator's input.
#[derive(Debug, Clone)]
pub struct ClaimRecord {
    pub claim: Claim,
    pub ingested_at: DateTime<Utc>,
}

/// One appearance of a group's claim in a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Occurrence {
    pub source_id: String,
    pub claim_id: String,
    pub ingested_at: DateTime<Utc>,
    pub start_s: f64,
}

/// A set of claims judged to state the same fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimGroup {
    /// Deterministic id: first 12 hex chars of the representative's
    /// global hash.
    pub id: String,
    pub representative_text: String,
    pub category: Category,
    pub claim_count: usize,
    /// Distinct sources the claim appeared in (the "spread").
    pub source_count: usize,
    pub first_seen: DateTime<Utc>,
    /// Timeline, ordered by source ingestion time then span start.
    pub occurrences: Vec<Occurrence>,
}

/// Advisory flag that two groups state conflicting numbers about the same
/// entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContradictionFlag {
    pub group_a: String,
    pub group_b: String,
    pub shared_entities: Vec<String>,
    pub number_a: f64,
    pub number_b: f64,
}

/// Aggregation output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Groups in top-claims order: spread desc, occurrences desc,
    /// first-seen asc.
    pub groups: Vec<ClaimGroup>,
    pub contradictions: Vec<ContradictionFlag>,
}

/// Disjoint-set over indices, path-halving.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // Smaller root wins so merge results don't depend on pair order.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

/// Group claims across sources and compute contradiction flags.
pub fn aggregate(records: &[ClaimRecord], config: &Config) -> AggregateResult {
    // 1. Exact grouping by global hash. BTreeMap keeps iteration stable.
    let mut by_hash: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, r) in records.iter().enumerate() {
        by_hash.entry(&r.claim.global_hash).or_default().push(i);
    }

    struct HashGroup {
        members: Vec<usize>,
        rep_idx: usize,
        tokens: Vec<String>,
        category: Category,
        first_week: u32,
    }

    let mut hash_groups: Vec<HashGroup> = Vec::new();
    for members in by_hash.values() {
        let rep_idx = representative(records, members);
        let rep = &records[rep_idx];
        let first = members
            .iter()
            .map(|&i| records[i].ingested_at)
            .min()
            .unwrap_or(rep.ingested_at);
        hash_groups.push(HashGroup {
            members: members.clone(),
            rep_idx,
            tokens: text::normalized_tokens(&rep.claim.text),
            category: rep.claim.category,
            first_week: week_key(first),
        });
    }

    // 2. Fuzzy merge within sliding (week, category) windows: groups in the
    // same or adjacent week bucket are compared pairwise.
    let mut uf = UnionFind::new(hash_groups.len());
    for i in 0..hash_groups.len() {
        for j in (i + 1)..hash_groups.len() {
            let (a, b) = (&hash_groups[i], &hash_groups[j]);
            if a.category != b.category {
                continue;
            }
            if a.first_week.abs_diff(b.first_week) > 1 {
                continue;
            }
            if text::token_similarity(&a.tokens, &b.tokens) >= config.fuzzy_group_threshold {
                uf.union(i, j);
            }
        }
    }

    // 3. Materialize merged groups.
    let mut merged: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..hash_groups.len() {
        let root = uf.find(i);
        merged.entry(root).or_default().push(i);
    }

    let mut groups: Vec<ClaimGroup> = Vec::new();
    for group_indices in merged.values() {
        let member_claims: Vec<usize> = group_indices
            .iter()
            .flat_map(|&gi| hash_groups[gi].members.iter().copied())
            .collect();
        let rep_idx = representative(records, &member_claims);
        let rep = &records[rep_idx];

        let mut occurrences: Vec<Occurrence> = member_claims
            .iter()
            .map(|&i| {
                let r = &records[i];
                Occurrence {
                    source_id: r.claim.source_id.clone(),
                    claim_id: r.claim.id.clone(),
                    ingested_at: r.ingested_at,
                    start_s: r.claim.start_s,
                }
            })
            .collect();
        occurrences.sort_by(|a, b| {
            a.ingested_at
                .cmp(&b.ingested_at)
                .then(a.start_s.partial_cmp(&b.start_s).unwrap_or(std::cmp::Ordering::Equal))
                .then(a.claim_id.cmp(&b.claim_id))
        });

        let source_count = {
            let mut unique: Vec<&str> =
                occurrences.iter().map(|o| o.source_id.as_str()).collect();
            unique.sort_unstable();
            unique.dedup();
            unique.len()
        };

        groups.push(ClaimGroup {
            id: rep.claim.global_hash[..12].to_string(),
            representative_text: rep.claim.text.clone(),
            category: rep.claim.category,
            claim_count: occurrences.len(),
            source_count,
            first_seen: occurrences
                .first()
                .map(|o| o.ingested_at)
                .unwrap_or(rep.ingested_at),
            occurrences,
        });
    }

    // 4. Top-claims ordering.
    groups.sort_by(|a, b| {
        b.source_count
            .cmp(&a.source_count)
            .then(b.claim_count.cmp(&a.claim_count))
            .then(a.first_seen.cmp(&b.first_seen))
            .then(a.id.cmp(&b.id))
    });

    let contradictions = find_contradictions(&groups, config);

    AggregateResult {
        groups,
        contradictions,
    }
}

/// Earliest occurrence wins representative; ties break on span then id.
fn representative(records: &[ClaimRecord], members: &[usize]) -> usize {
    members
        .iter()
        .copied()
        .min_by(|&a, &b| {
            let (ra, rb) = (&records[a], &records[b]);
            ra.ingested_at
                .cmp(&rb.ingested_at)
                .then(
                    ra.claim
                        .start_s
                        .partial_cmp(&rb.claim.start_s)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(ra.claim.id.cmp(&rb.claim.id))
        })
        .expect("non-empty group")
}

fn week_key(ts: DateTime<Utc>) -> u32 {
    let week = ts.iso_week();
    week.year() as u32 * 53 + week.week()
}

/// Two groups are flagged when they share >= 2 entities and the same
/// category, a number differs by a factor >= 1.25 (or in sign), and their
/// representatives barely align on keyphrases.
fn find_contradictions(groups: &[ClaimGroup], config: &Config) -> Vec<ContradictionFlag> {
    const RATIO: f64 = 1.25;
    const ALIGNMENT_CEILING: f64 = 0.3;

    let features: Vec<(Vec<String>, Vec<numbers::NumberMention>, Vec<String>)> = groups
        .iter()
        .map(|g| {
            let ents: Vec<String> = entities::detect(&g.representative_text, &config.entity_allowlist)
                .into_iter()
                .map(|e| e.text.to_lowercase())
                .collect();
            let dates = text::dates::detect(&g.representative_text);
            let nums = numbers::detect_significant(&g.representative_text, &dates);
            let tokens = text::normalized_tokens(&g.representative_text);
            (ents, nums, tokens)
        })
        .collect();

    let mut flags = Vec::new();
    for i in 0..groups.len() {
        for j in (i + 1)..groups.len() {
            if groups[i].category != groups[j].category {
                continue;
            }
            let (ents_a, nums_a, toks_a) = &features[i];
            let (ents_b, nums_b, toks_b) = &features[j];

            let shared: Vec<String> = ents_a
                .iter()
                .filter(|e| ents_b.contains(e))
                .cloned()
                .collect();
            if shared.len() < 2 {
                continue;
            }

            let Some((na, nb)) = conflicting_pair(nums_a, nums_b, RATIO) else {
                continue;
            };

            let alignment = match text::longest_common_ngram(toks_a, toks_b, 3) {
                Some((n, _)) => n as f64 / toks_a.len().min(toks_b.len()).max(1) as f64,
                None => 0.0,
            };
            if alignment >= ALIGNMENT_CEILING {
                continue;
            }

            flags.push(ContradictionFlag {
                group_a: groups[i].id.clone(),
                group_b: groups[j].id.clone(),
                shared_entities: shared,
                number_a: na,
                number_b: nb,
            });
        }
    }
    flags
}

fn conflicting_pair(
    a: &[numbers::NumberMention],
    b: &[numbers::NumberMention],
    ratio: f64,
) -> Option<(f64, f64)> {
    for na in a {
        for nb in b {
            if na.value.signum() != nb.value.signum() && na.value != 0.0 && nb.value != 0.0 {
                return Some((na.value, nb.value));
            }
            let (lo, hi) = if na.value.abs() <= nb.value.abs() {
                (na.value.abs(), nb.value.abs())
            } else {
                (nb.value.abs(), na.value.abs())
            };
            if lo > 0.0 && hi / lo >= ratio {
                return Some((na.value, nb.value));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClaimStatus, ConfidenceLanguage};
    use chrono::TimeZone;

    fn record(text_value: &str, source_id: &str, day: u32, category: Category) -> ClaimRecord {
        let hash = text::content_hash(text_value);
        ClaimRecord {
            claim: Claim {
                id: format!("{}-{}", source_id, &hash[..8]),
                source_id: source_id.to_string(),
                text: text_value.to_string(),
                start_s: 1.0,
                end_s: 5.0,
                content_hash: hash.clone(),
                global_hash: hash,
                confidence_language: ConfidenceLanguage::Definitive,
                category,
                signal_log: vec!["num=1".to_string()],
                status: ClaimStatus::Unknown,
                created_at: Utc::now(),
            },
            ingested_at: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_exact_spread_across_sources() {
        let config = Config::default();
        let text_value = "GDP grew 2.8% in 2024 according to the official estimate.";
        let records = vec![
            record(text_value, "src_a", 1, Category::Finance),
            record(text_value, "src_b", 3, Category::Finance),
        ];
        let result = aggregate(&records, &config);
        assert_eq!(result.groups.len(), 1);
        let g = &result.groups[0];
        assert_eq!(g.source_count, 2);
        assert_eq!(g.claim_count, 2);
        // Timeline ordered by ingestion time.
        assert_eq!(g.occurrences[0].source_id, "src_a");
        assert_eq!(g.occurrences[1].source_id, "src_b");
        assert_eq!(g.first_seen, records[0].ingested_at);
    }

    #[test]
    fn test_fuzzy_merge_same_week() {
        let config = Config::default();
        let records = vec![
            record(
                "The Fed cut interest rates by 25 basis points on Wednesday morning.",
                "src_a",
                1,
                Category::Finance,
            ),
            record(
                "The Fed cut interest rates by 25 basis points on Wednesday.",
                "src_b",
                2,
                Category::Finance,
            ),
        ];
        let result = aggregate(&records, &config);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].source_count, 2);
    }

    #[test]
    fn test_no_fuzzy_merge_across_categories() {
        let config = Config::default();
        let records = vec![
            record(
                "The agency reported 500 new cases of the disease last month.",
                "src_a",
                1,
                Category::Health,
            ),
            record(
                "The agency reported 500 new cases of the disease last month too.",
                "src_b",
                2,
                Category::Science,
            ),
        ];
        let result = aggregate(&records, &config);
        assert_eq!(result.groups.len(), 2);
    }

    #[test]
    fn test_top_claims_ordering() {
        let config = Config::default();
        let spread_text = "GDP grew 2.8% in 2024 according to the official estimate.";
        let records = vec![
            record(spread_text, "src_a", 2, Category::Finance),
            record(spread_text, "src_b", 3, Category::Finance),
            record(
                "Unemployment held at 3.9 percent for the third straight month.",
                "src_a",
                1,
                Category::Labor,
            ),
        ];
        let result = aggregate(&records, &config);
        assert_eq!(result.groups.len(), 2);
        // The two-source group ranks above the singleton despite later first-seen.
        assert_eq!(result.groups[0].source_count, 2);
        assert_eq!(result.groups[1].source_count, 1);
    }

    #[test]
    fn test_contradiction_flagged() {
        let config = Config::default();
        let records = vec![
            record(
                "Goldman Sachs analysts said ten year Treasury yields reached 4.8 percent during early March trading.",
                "src_a",
                1,
                Category::Finance,
            ),
            record(
                "Goldman Sachs told Treasury investors that yields sat near 2.1 percent in March sessions.",
                "src_b",
                2,
                Category::Finance,
            ),
        ];
        let result = aggregate(&records, &config);
        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.contradictions.len(), 1);
        let flag = &result.contradictions[0];
        assert!(flag.shared_entities.len() >= 2);
    }

    #[test]
    fn test_no_contradiction_when_numbers_agree() {
        let config = Config::default();
        let records = vec![
            record(
                "Goldman Sachs said Treasury yields reached 4.8 percent in March.",
                "src_a",
                1,
                Category::Finance,
            ),
            record(
                "Goldman Sachs economists pegged March Treasury yields around 4.8 percent.",
                "src_b",
                2,
                Category::Finance,
            ),
        ];
        let result = aggregate(&records, &config);
        assert!(result.contradictions.is_empty());
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let config = Config::default();
        let records = vec![
            record("GDP grew 2.8% in 2024 according to the estimate.", "src_a", 1, Category::Finance),
            record("GDP grew 2.8% in 2024 according to the estimate.", "src_b", 2, Category::Finance),
            record("Unemployment held at 3.9 percent for months.", "src_c", 3, Category::Labor),
        ];
        let a = aggregate(&records, &config);
        let b = aggregate(&records, &config);
        let ids_a: Vec<&str> = a.groups.iter().map(|g| g.id.as_str()).collect();
        let ids_b: Vec<&str> = b.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids_a, ids_b);
    }
}
