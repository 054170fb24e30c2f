//! Domain types for the verification engine.
//!
//! This module contains the core data structures:
//! - Claims: extracted factual assertions with hashes and signal logs
//! - Evidence: adapter candidates and scored results with breakdowns

pub mod claim;
pub mod evidence;

// Re-export commonly used types
pub use claim::{
    new_id, Category, Claim, ClaimStatus, ConfidenceLanguage, Source, SourceKind, TimedSegment,
};
pub use evidence::{EvidenceCandidate, EvidenceType, ScoredEvidence, SourceApi};
