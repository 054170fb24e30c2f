//! Persistence contract and the file-backed store.
//!
//! The core only requires: uniqueness of `(source_id, content_hash)`,
//! uniqueness of `(claim_id, candidate.url)`, atomic per-claim writes of
//! claim + evidence + auto-status, and scannability of `global_hash`.
//! [`JsonlStore`] implements the contract with newline-delimited JSON under
//! `$VERITAS_HOME/sources/<id>/`, rewriting files through a temp-file
//! rename so a crash leaves each claim fully processed or untouched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::{Claim, ClaimStatus, ScoredEvidence, Source, TimedSegment};

/// Store failure. Surfaced to the orchestrator; the claim in flight rolls
/// back and processing continues with the next claim.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown source '{0}'")]
    UnknownSource(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Verification state for one claim: its evidence set and status,
/// persisted as a single record so the write is atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub claim_id: String,
    pub status: ClaimStatus,
    /// True when the status was set by a human reviewer. Human verdicts
    /// win over auto re-scoring and are the only way to CONTRADICTED.
    #[serde(default)]
    pub human: bool,
    pub evidence: Vec<ScoredEvidence>,
}

/// Persistence contract the engine consumes.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn put_source(&self, source: &Source) -> Result<(), StoreError>;
    async fn get_source(&self, source_id: &str) -> Result<Option<Source>, StoreError>;
    async fn list_sources(&self) -> Result<Vec<Source>, StoreError>;

    async fn put_segments(
        &self,
        source_id: &str,
        segments: &[TimedSegment],
    ) -> Result<(), StoreError>;
    async fn list_segments(&self, source_id: &str) -> Result<Vec<TimedSegment>, StoreError>;

    /// Insert claims, skipping any whose `content_hash` is already present
    /// for this source. Returns the number actually inserted.
    async fn insert_claims(&self, source_id: &str, claims: &[Claim]) -> Result<usize, StoreError>;
    async fn claims_for_source(&self, source_id: &str) -> Result<Vec<Claim>, StoreError>;

    /// Record a claim's evidence and auto-status atomically.
    ///
    /// Evidence is append-only per `(claim_id, url)`; re-recording the same
    /// candidates adds nothing. Status transitions are monotonic: an
    /// existing SUPPORTED/PARTIAL never downgrades unless the evidence set
    /// is emptied, and a human verdict is never overwritten. Returns the
    /// effective status.
    async fn record_verification(
        &self,
        source_id: &str,
        claim_id: &str,
        evidence: &[ScoredEvidence],
        status: ClaimStatus,
    ) -> Result<ClaimStatus, StoreError>;

    /// Human review override: set a claim's status unconditionally,
    /// optionally attaching evidence. Not subject to the auto-scoring
    /// monotonicity rules, and the only path that may set CONTRADICTED.
    async fn override_status(
        &self,
        source_id: &str,
        claim_id: &str,
        status: ClaimStatus,
        evidence: &[ScoredEvidence],
    ) -> Result<(), StoreError>;

    async fn verification(
        &self,
        source_id: &str,
        claim_id: &str,
    ) -> Result<Option<VerificationRecord>, StoreError>;
    async fn verifications_for_source(
        &self,
        source_id: &str,
    ) -> Result<Vec<VerificationRecord>, StoreError>;
}

/// File-backed store: one directory per source holding `source.json`,
/// `segments.json`, `claims.jsonl`, and `verifications.jsonl`.
pub struct JsonlStore {
    root: PathBuf,
}

impl JsonlStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the store under the configured home directory.
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(crate::config::Config::home_dir()?))
    }

    fn source_dir(&self, source_id: &str) -> PathBuf {
        self.root.join("sources").join(source_id)
    }

    async fn require_source_dir(&self, source_id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.source_dir(source_id);
        if !dir.exists() {
            return Err(StoreError::UnknownSource(source_id.to_string()));
        }
        Ok(dir)
    }

    /// Write a file atomically: temp file in the same directory, then rename.
    async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
        let tmp = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(content).await?;
        file.flush().await?;
        drop(file);
        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn read_jsonl<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, StoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path).await?;
        let mut out = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            out.push(serde_json::from_str(line)?);
        }
        Ok(out)
    }

    fn to_jsonl<T: Serialize>(items: &[T]) -> Result<Vec<u8>, StoreError> {
        let mut buffer = Vec::new();
        for item in items {
            serde_json::to_writer(&mut buffer, item)?;
            buffer.push(b'\n');
        }
        Ok(buffer)
    }
}

/// Append new evidence, keeping `(claim_id, url)` unique.
fn merge_evidence(
    mut existing: Vec<ScoredEvidence>,
    incoming: &[ScoredEvidence],
) -> Vec<ScoredEvidence> {
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|e| e.candidate.url.clone())
        .collect();
    for item in incoming {
        if seen.insert(item.candidate.url.clone()) {
            existing.push(item.clone());
        }
    }
    existing
}

#[async_trait]
impl ClaimStore for JsonlStore {
    async fn put_source(&self, source: &Source) -> Result<(), StoreError> {
        let dir = self.source_dir(&source.id);
        fs::create_dir_all(&dir).await?;
        let json = serde_json::to_vec_pretty(source)?;
        Self::write_atomic(&dir.join("source.json"), &json).await
    }

    async fn get_source(&self, source_id: &str) -> Result<Option<Source>, StoreError> {
        let path = self.source_dir(source_id).join("source.json");
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn list_sources(&self) -> Result<Vec<Source>, StoreError> {
        let sources_dir = self.root.join("sources");
        if !sources_dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        let mut entries = fs::read_dir(&sources_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path().join("source.json");
            if path.exists() {
                let content = fs::read_to_string(&path).await?;
                out.push(serde_json::from_str(&content)?);
            }
        }
        out.sort_by(|a: &Source, b: &Source| a.ingested_at.cmp(&b.ingested_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn put_segments(
        &self,
        source_id: &str,
        segments: &[TimedSegment],
    ) -> Result<(), StoreError> {
        let dir = self.require_source_dir(source_id).await?;
        let json = serde_json::to_vec_pretty(segments)?;
        Self::write_atomic(&dir.join("segments.json"), &json).await
    }

    async fn list_segments(&self, source_id: &str) -> Result<Vec<TimedSegment>, StoreError> {
        let dir = self.require_source_dir(source_id).await?;
        let path = dir.join("segments.json");
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn insert_claims(&self, source_id: &str, claims: &[Claim]) -> Result<usize, StoreError> {
        let dir = self.require_source_dir(source_id).await?;
        let path = dir.join("claims.jsonl");

        let existing: Vec<Claim> = Self::read_jsonl(&path).await?;
        let mut seen: HashSet<String> =
            existing.iter().map(|c| c.content_hash.clone()).collect();

        let mut merged = existing;
        let mut inserted = 0usize;
        for claim in claims {
            if seen.insert(claim.content_hash.clone()) {
                merged.push(claim.clone());
                inserted += 1;
            }
        }

        if inserted > 0 {
            Self::write_atomic(&path, &Self::to_jsonl(&merged)?).await?;
        }
        Ok(inserted)
    }

    async fn claims_for_source(&self, source_id: &str) -> Result<Vec<Claim>, StoreError> {
        let dir = self.require_source_dir(source_id).await?;
        Self::read_jsonl(&dir.join("claims.jsonl")).await
    }

    async fn record_verification(
        &self,
        source_id: &str,
        claim_id: &str,
        evidence: &[ScoredEvidence],
        status: ClaimStatus,
    ) -> Result<ClaimStatus, StoreError> {
        let dir = self.require_source_dir(source_id).await?;
        let path = dir.join("verifications.jsonl");

        let mut records: Vec<VerificationRecord> = Self::read_jsonl(&path).await?;
        let existing_idx = records.iter().position(|r| r.claim_id == claim_id);

        let previous = existing_idx.map(|idx| (records[idx].status, records[idx].human));
        let merged_evidence = match existing_idx {
            Some(idx) => merge_evidence(records[idx].evidence.clone(), evidence),
            None => merge_evidence(Vec::new(), evidence),
        };

        let effective = match previous {
            // A human verdict is never overwritten by auto re-scoring.
            Some((prev, true)) => prev,
            // Never downgrade while the supporting evidence is still there.
            Some((prev, false)) if prev.rank() > status.rank() && !merged_evidence.is_empty() => {
                prev
            }
            _ => status,
        };

        let record = VerificationRecord {
            claim_id: claim_id.to_string(),
            status: effective,
            human: previous.map(|(_, h)| h).unwrap_or(false),
            evidence: merged_evidence,
        };
        match existing_idx {
            Some(idx) => records[idx] = record,
            None => records.push(record),
        }

        Self::write_atomic(&path, &Self::to_jsonl(&records)?).await?;
        Ok(effective)
    }

    async fn override_status(
        &self,
        source_id: &str,
        claim_id: &str,
        status: ClaimStatus,
        evidence: &[ScoredEvidence],
    ) -> Result<(), StoreError> {
        let dir = self.require_source_dir(source_id).await?;
        let path = dir.join("verifications.jsonl");

        let mut records: Vec<VerificationRecord> = Self::read_jsonl(&path).await?;
        let existing_idx = records.iter().position(|r| r.claim_id == claim_id);

        let merged_evidence = match existing_idx {
            Some(idx) => merge_evidence(records[idx].evidence.clone(), evidence),
            None => merge_evidence(Vec::new(), evidence),
        };

        let record = VerificationRecord {
            claim_id: claim_id.to_string(),
            status,
            human: true,
            evidence: merged_evidence,
        };
        match existing_idx {
            Some(idx) => records[idx] = record,
            None => records.push(record),
        }

        Self::write_atomic(&path, &Self::to_jsonl(&records)?).await
    }

    async fn verification(
        &self,
        source_id: &str,
        claim_id: &str,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let all = self.verifications_for_source(source_id).await?;
        Ok(all.into_iter().find(|r| r.claim_id == claim_id))
    }

    async fn verifications_for_source(
        &self,
        source_id: &str,
    ) -> Result<Vec<VerificationRecord>, StoreError> {
        let dir = self.require_source_dir(source_id).await?;
        Self::read_jsonl(&dir.join("verifications.jsonl")).await
    }
}
