//! Evidence candidate and scored-evidence types.
//!
//! These types represent what an evidence-source adapter returns and what
//! the scorer persists alongside a claim.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::text::numbers::NumberMention;

/// Identifier of an evidence-source API.
///
/// Declaration order is the fixed deterministic tie-break order used by the
/// router when boost scores are equal. `Manual` marks evidence attached by
/// a human reviewer; it never appears in routing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceApi {
    Yfinance,
    SecEdgar,
    Fred,
    Bls,
    Cbo,
    Usaspending,
    Census,
    Worldbank,
    Patentsview,
    Openfda,
    Pubmed,
    Arxiv,
    Crossref,
    SemanticScholar,
    Wikipedia,
    GoogleFactcheck,
    Manual,
}

impl SourceApi {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceApi::Yfinance => "yfinance",
            SourceApi::SecEdgar => "sec_edgar",
            SourceApi::Fred => "fred",
            SourceApi::Bls => "bls",
            SourceApi::Cbo => "cbo",
            SourceApi::Usaspending => "usaspending",
            SourceApi::Census => "census",
            SourceApi::Worldbank => "worldbank",
            SourceApi::Patentsview => "patentsview",
            SourceApi::Openfda => "openfda",
            SourceApi::Pubmed => "pubmed",
            SourceApi::Arxiv => "arxiv",
            SourceApi::Crossref => "crossref",
            SourceApi::SemanticScholar => "semantic_scholar",
            SourceApi::Wikipedia => "wikipedia",
            SourceApi::GoogleFactcheck => "google_factcheck",
            SourceApi::Manual => "manual",
        }
    }

    /// Position in the fixed tie-break order.
    pub fn order_index(&self) -> usize {
        *self as usize
    }
}

/// Kind of evidence an adapter produces. Fixed per adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Filing,
    Dataset,
    Paper,
    Gov,
    Secondary,
    Factcheck,
}

impl EvidenceType {
    /// Whether this type counts as a primary source for the SUPPORTED
    /// guardrail.
    pub fn is_primary(&self) -> bool {
        !matches!(self, EvidenceType::Secondary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceType::Filing => "filing",
            EvidenceType::Dataset => "dataset",
            EvidenceType::Paper => "paper",
            EvidenceType::Gov => "gov",
            EvidenceType::Secondary => "secondary",
            EvidenceType::Factcheck => "factcheck",
        }
    }
}

/// A normalized evidence candidate returned by an adapter.
///
/// `entities`, `numbers`, and `keyphrases` are populated by the adapter from
/// title + snippet using the same detectors the extractor uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceCandidate {
    pub source_api: SourceApi,
    pub evidence_type: EvidenceType,
    pub title: String,
    pub snippet: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<NaiveDate>,
    pub entities: Vec<String>,
    pub numbers: Vec<NumberMention>,
    pub keyphrases: Vec<String>,
}

/// A candidate scored against a claim, with the full signal breakdown.
///
/// Invariant: the breakdown values sum exactly to `score`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredEvidence {
    pub claim_id: String,
    pub candidate: EvidenceCandidate,
    /// 0..=100.
    pub score: i32,
    /// Per-signal contributions, persisted verbatim.
    pub breakdown: BTreeMap<String, i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_keyphrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_number: Option<f64>,
}
