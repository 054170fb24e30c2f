//! Claim and source data types.
//!
//! A claim is a self-contained, checkable factual assertion extracted from a
//! transcript. Claims are immutable in text, span, and hashes once created;
//! only the verification status and attached evidence set change afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a short id (first 12 hex chars of a v4 UUID).
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// A single transcript segment with timing.
///
/// Segments must be non-overlapping and ordered by `start_s`. For text
/// inputs the timestamps are synthetic and only meaningful for ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedSegment {
    pub text: String,
    pub start_s: f64,
    pub end_s: f64,
}

impl TimedSegment {
    pub fn new(text: impl Into<String>, start_s: f64, end_s: f64) -> Self {
        Self {
            text: text.into(),
            start_s,
            end_s,
        }
    }
}

/// Kind of ingested source material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Audio,
    Video,
    Text,
    Pdf,
    Web,
}

/// An ingested source the core references by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub kind: SourceKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    pub ingested_at: DateTime<Utc>,
}

/// Confidence language detected in a claim sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLanguage {
    Hedged,
    Definitive,
    Unknown,
}

/// Topic category assigned by the keyword classifier.
///
/// Declaration order is the fixed tie-break priority: when two categories
/// score equally, the one declared first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Finance,
    Health,
    Science,
    Tech,
    Politics,
    Military,
    Education,
    EnergyClimate,
    Labor,
    General,
}

impl Category {
    /// All categories in tie-break priority order.
    pub const ALL: [Category; 10] = [
        Category::Finance,
        Category::Health,
        Category::Science,
        Category::Tech,
        Category::Politics,
        Category::Military,
        Category::Education,
        Category::EnergyClimate,
        Category::Labor,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Finance => "finance",
            Category::Health => "health",
            Category::Science => "science",
            Category::Tech => "tech",
            Category::Politics => "politics",
            Category::Military => "military",
            Category::Education => "education",
            Category::EnergyClimate => "energy_climate",
            Category::Labor => "labor",
            Category::General => "general",
        }
    }
}

/// Verification status of a claim.
///
/// `Contradicted` is reserved for human review; no code path in the core
/// sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Unknown,
    Partial,
    Supported,
    Contradicted,
}

impl ClaimStatus {
    /// Ordering used when picking the best verdict across candidates.
    pub fn rank(&self) -> u8 {
        match self {
            ClaimStatus::Unknown => 0,
            ClaimStatus::Partial => 1,
            ClaimStatus::Supported => 2,
            ClaimStatus::Contradicted => 3,
        }
    }
}

impl Default for ClaimStatus {
    fn default() -> Self {
        ClaimStatus::Unknown
    }
}

/// An extracted claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub source_id: String,
    /// Canonical claim surface (7..=240 words-and-chars gated).
    pub text: String,
    pub start_s: f64,
    pub end_s: f64,
    /// SHA-256 of the normalized text; local dedup key with `source_id`.
    pub content_hash: String,
    /// Cross-source identity hash (same normalization as `content_hash`).
    pub global_hash: String,
    pub confidence_language: ConfidenceLanguage,
    pub category: Category,
    /// Ordered tags recording which extraction rules fired.
    pub signal_log: Vec<String>,
    #[serde(default)]
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_length() {
        let id = new_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_status_rank_ordering() {
        assert!(ClaimStatus::Supported.rank() > ClaimStatus::Partial.rank());
        assert!(ClaimStatus::Partial.rank() > ClaimStatus::Unknown.rank());
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&Category::EnergyClimate).unwrap();
        assert_eq!(json, "\"energy_climate\"");
    }

    #[test]
    fn test_category_priority_order() {
        // Finance wins every tie; General never wins one.
        assert_eq!(Category::ALL[0], Category::Finance);
        assert_eq!(Category::ALL[9], Category::General);
    }
}
