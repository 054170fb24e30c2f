//! Aggregation Integration Tests
//!
//! Cross-source spread, timeline ordering, top-claims ranking, and the
//! advisory contradiction flags, driven through the extractor so the
//! grouping sees real claims.

use chrono::{TimeZone, Utc};
use veritas::aggregate::{aggregate, ClaimRecord};
use veritas::{Category, ClaimExtractor, Config, TimedSegment};

fn records_for(
    source_id: &str,
    day: u32,
    lines: &[&str],
    config: &Config,
) -> Vec<ClaimRecord> {
    let ingested = Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap();
    let segments: Vec<TimedSegment> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| TimedSegment::new(*line, i as f64 * 5.0, (i as f64 + 1.0) * 5.0))
        .collect();
    ClaimExtractor::new(config)
        .extract(source_id, &segments, ingested)
        .unwrap()
        .into_iter()
        .map(|claim| ClaimRecord {
            claim,
            ingested_at: ingested,
        })
        .collect()
}

#[test]
fn test_repeated_claim_forms_one_group() {
    let config = Config::default();
    let line = "They said GDP grew 2.8 percent in 2024 across the economy.";
    let mut records = records_for("src_a", 1, &[line], &config);
    records.extend(records_for("src_b", 3, &[line], &config));

    let result = aggregate(&records, &config);
    assert_eq!(result.groups.len(), 1);

    let group = &result.groups[0];
    assert_eq!(group.source_count, 2);
    assert_eq!(group.claim_count, 2);
    assert_eq!(group.occurrences[0].source_id, "src_a");
    assert_eq!(group.occurrences[1].source_id, "src_b");
    assert_eq!(group.first_seen, group.occurrences[0].ingested_at);
}

#[test]
fn test_spread_ranks_above_singletons() {
    let config = Config::default();
    let shared = "They said GDP grew 2.8 percent in 2024 across the economy.";
    let lone = "They announced unemployment reached a record low of 3.5 percent.";

    let mut records = records_for("src_a", 1, &[lone, shared], &config);
    records.extend(records_for("src_b", 2, &[shared], &config));

    let result = aggregate(&records, &config);
    assert!(result.groups.len() >= 2);
    assert_eq!(result.groups[0].source_count, 2);
    assert!(result.groups[0].representative_text.contains("GDP"));
}

#[test]
fn test_fuzzy_grouping_merges_rewordings() {
    let config = Config::default();
    let mut records = records_for(
        "src_a",
        1,
        &["They said the Fed cut interest rates by 25 basis points on Wednesday."],
        &config,
    );
    records.extend(records_for(
        "src_b",
        2,
        &["They said the Fed cut interest rates by 25 basis points on Wednesday again."],
        &config,
    ));

    let result = aggregate(&records, &config);
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].source_count, 2);
}

#[test]
fn test_distant_weeks_not_fuzzy_merged() {
    let config = Config::default();
    // Same wording, but the second source lands three weeks later; only the
    // exact global hash may group them, and these differ by one word.
    let mut records = records_for(
        "src_a",
        1,
        &["They said the Fed cut interest rates by 25 basis points on Wednesday."],
        &config,
    );
    records.extend(records_for(
        "src_b",
        28,
        &["They said the Fed cut interest rates by 25 basis points on Wednesday again."],
        &config,
    ));

    let result = aggregate(&records, &config);
    assert_eq!(result.groups.len(), 2);
}

#[test]
fn test_contradiction_flags_are_advisory() {
    let config = Config::default();
    let mut records = records_for(
        "src_a",
        1,
        &["Goldman Sachs analysts said ten year Treasury yields reached 4.8 percent during early March trading."],
        &config,
    );
    records.extend(records_for(
        "src_b",
        2,
        &["Goldman Sachs told Treasury investors that yields sat near 2.1 percent in March sessions."],
        &config,
    ));

    let result = aggregate(&records, &config);
    assert_eq!(result.contradictions.len(), 1);

    // Advisory only: statuses on the underlying claims are untouched.
    for record in &records {
        assert_eq!(record.claim.status, veritas::ClaimStatus::Unknown);
    }
    let flag = &result.contradictions[0];
    assert!(flag.shared_entities.len() >= 2);
    assert!(flag.number_a.max(flag.number_b) / flag.number_a.min(flag.number_b) >= 1.25);
}

#[test]
fn test_groups_carry_category() {
    let config = Config::default();
    let records = records_for(
        "src_a",
        1,
        &["They said GDP grew 2.8 percent in 2024 across the economy."],
        &config,
    );
    let result = aggregate(&records, &config);
    assert_eq!(result.groups[0].category, Category::Finance);
}
