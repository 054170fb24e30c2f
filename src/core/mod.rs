//! Orchestration and persistence.
//!
//! - `orchestrator`: per-source pipeline from segments to stored evidence
//! - `store`: persistence contract + the JSONL-backed implementation

pub mod orchestrator;
pub mod store;

pub use orchestrator::{Orchestrator, RunReport};
pub use store::{ClaimStore, JsonlStore, StoreError, VerificationRecord};
