//! veritas - deterministic claim extraction and fact verification
//!
//! A rule-based engine that turns long-form transcripts into atomic,
//! checkable claims, links each claim to evidence candidates from
//! structured public APIs, and scores that evidence with explainable
//! signals. Every verdict is auditable: the extraction signals, the
//! sources consulted, and the per-signal score contributions are persisted
//! alongside the result.
//!
//! # Architecture
//!
//! The pipeline is deterministic end to end:
//! - segments are stitched, split, filtered, classified, and deduplicated
//!   into claims
//! - a content-signal router picks which evidence APIs to query per claim
//! - adapters fetch and normalize candidates (absorbing every failure)
//! - the scorer produces a 0-100 score with a per-signal breakdown, and
//!   guardrails decide SUPPORTED / PARTIAL / UNKNOWN (never CONTRADICTED)
//! - the aggregator groups equivalent claims across sources
//!
//! # Modules
//!
//! - `text`: tokenizer, normalization, number/date/entity detectors
//! - `extract`: claim extractor (stitch, split, classify, dedup)
//! - `route`: content-signal source routing
//! - `adapters`: evidence-source API clients behind a flat registry
//! - `score`: evidence scoring + auto-status guardrails
//! - `aggregate`: cross-source groups, timelines, contradiction flags
//! - `core`: orchestrator and persistence
//! - `ingest`: text → pseudo-segments, transcript loading
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! veritas ingest talk.txt --title "Earnings call"
//! veritas extract <source-id>
//! veritas assist <source-id>
//! veritas aggregate
//! ```

pub mod adapters;
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod extract;
pub mod ingest;
pub mod route;
pub mod score;
pub mod text;

// Re-export main types at crate root for convenience
pub use aggregate::{AggregateResult, ClaimGroup, ContradictionFlag};
pub use config::{Config, ConfigError};
pub use self::core::{ClaimStore, JsonlStore, Orchestrator, RunReport, StoreError};
pub use domain::{
    Category, Claim, ClaimStatus, ConfidenceLanguage, EvidenceCandidate, EvidenceType,
    ScoredEvidence, Source, SourceApi, SourceKind, TimedSegment,
};
pub use extract::{ClaimExtractor, InputError};
