//! Per-source pipeline orchestration.
//!
//! `extract` turns segments into persisted claims; `assist` routes each
//! claim to evidence sources, fans out the fetches with bounded
//! concurrency, scores candidates, and persists evidence with auto-status;
//! `aggregate` rebuilds the cross-source view.
//!
//! Adapter fetches for one claim run in parallel, but completed results are
//! buffered per source and flushed in router order, so persisted evidence
//! order never depends on network timing. Claims are processed strictly in
//! sequence.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::adapters::{AdapterRegistry, FetchRequest};
use crate::aggregate::{self, AggregateResult, ClaimRecord};
use crate::config::Config;
use crate::domain::{Claim, ClaimStatus, EvidenceCandidate, SourceApi};
use crate::extract::ClaimExtractor;
use crate::route;
use crate::score::{self, Scorer};

use super::store::ClaimStore;

/// Per-source run counts, reported by `assist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub source_id: String,
    pub extracted: usize,
    pub evidenced: usize,
    pub supported: usize,
    pub partial: usize,
    pub unknown: usize,
    pub errored: usize,
    /// True when the per-source deadline cut processing short.
    pub deadline_hit: bool,
}

/// Engine orchestrator.
pub struct Orchestrator {
    config: Arc<Config>,
    store: Arc<dyn ClaimStore>,
    registry: Arc<AdapterRegistry>,
    per_source_deadline: Option<Duration>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn ClaimStore>,
        registry: Arc<AdapterRegistry>,
    ) -> Self {
        Self {
            config,
            store,
            registry,
            per_source_deadline: None,
        }
    }

    /// Bound the total time `assist` may spend on one source.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.per_source_deadline = Some(deadline);
        self
    }

    /// Extract claims for a source and persist them.
    ///
    /// Malformed segments fail the whole source; nothing partial is stored.
    #[instrument(skip(self))]
    pub async fn extract(&self, source_id: &str) -> Result<Vec<Claim>> {
        let source = self
            .store
            .get_source(source_id)
            .await?
            .with_context(|| format!("Unknown source '{}'", source_id))?;
        let segments = self.store.list_segments(source_id).await?;

        let extractor = ClaimExtractor::new(&self.config);
        // Creation time comes from the source so re-extraction is stable.
        let claims = extractor.extract(source_id, &segments, source.ingested_at)?;

        let inserted = self.store.insert_claims(source_id, &claims).await?;
        info!(source_id, total = claims.len(), inserted, "Extraction complete");

        self.store.claims_for_source(source_id).await.map_err(Into::into)
    }

    /// Route, fetch, score, and persist evidence for every claim of a source.
    #[instrument(skip(self))]
    pub async fn assist(&self, source_id: &str) -> Result<RunReport> {
        let source = self
            .store
            .get_source(source_id)
            .await?
            .with_context(|| format!("Unknown source '{}'", source_id))?;
        let claims = self.store.claims_for_source(source_id).await?;

        let scorer = Scorer::new(&self.config);
        let deadline = self.per_source_deadline.map(|d| Instant::now() + d);

        let mut report = RunReport {
            source_id: source_id.to_string(),
            extracted: claims.len(),
            evidenced: 0,
            supported: 0,
            partial: 0,
            unknown: 0,
            errored: 0,
            deadline_hit: false,
        };

        for claim in &claims {
            let remaining = match deadline {
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        report.deadline_hit = true;
                        break;
                    }
                    Some(d - now)
                }
                None => None,
            };

            let order = route::route(&claim.text, claim.category, &self.config);
            let request =
                FetchRequest::from_claim(&claim.text, claim.category, &self.config);

            let fetched = match self.fan_out(&order, request, remaining).await {
                Some(buffer) => buffer,
                None => {
                    // Deadline expired mid-flight: discard partial responses,
                    // leave this and later claims untouched (UNKNOWN).
                    report.deadline_hit = true;
                    break;
                }
            };

            // Flush the completion buffer in router order.
            let mut scored = Vec::new();
            for source_api in &order {
                if let Some(candidates) = fetched.get(source_api) {
                    for candidate in candidates {
                        scored.push(scorer.score(claim, candidate, source.ingested_at));
                    }
                }
            }

            let status = score::auto_status(&scored);
            match self
                .store
                .record_verification(source_id, &claim.id, &scored, status)
                .await
            {
                Ok(effective) => {
                    if !scored.is_empty() {
                        report.evidenced += 1;
                    }
                    match effective {
                        ClaimStatus::Supported => report.supported += 1,
                        ClaimStatus::Partial => report.partial += 1,
                        _ => report.unknown += 1,
                    }
                }
                Err(e) => {
                    warn!(
                        source_id,
                        claim_id = %claim.id,
                        error = %e,
                        "Persisting evidence failed, continuing with next claim"
                    );
                    report.errored += 1;
                }
            }
        }

        // Claims the deadline skipped stay UNKNOWN.
        report.unknown += report.extracted
            - (report.supported + report.partial + report.unknown + report.errored);

        info!(
            source_id,
            extracted = report.extracted,
            evidenced = report.evidenced,
            supported = report.supported,
            partial = report.partial,
            errored = report.errored,
            "Assist complete"
        );
        Ok(report)
    }

    /// Parallel adapter fan-out for one claim, bounded by the configured
    /// concurrency cap. Results land in a buffer keyed by source id.
    /// Returns `None` if the deadline expired before all fetches finished.
    async fn fan_out(
        &self,
        order: &[SourceApi],
        request: FetchRequest,
        remaining: Option<Duration>,
    ) -> Option<HashMap<SourceApi, Vec<EvidenceCandidate>>> {
        let semaphore = Arc::new(Semaphore::new(self.config.fetch_concurrency));
        let request = Arc::new(request);

        let mut futures = FuturesUnordered::new();
        for &source_api in order {
            if !self.registry.contains(source_api) {
                debug!(source = source_api.as_str(), "No adapter, skipping");
                continue;
            }
            let registry = Arc::clone(&self.registry);
            let request = Arc::clone(&request);
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let _permit = semaphore.acquire().await.expect("semaphore open");
                let candidates = registry.fetch(source_api, &request).await;
                (source_api, candidates)
            });
        }

        let collect = async {
            let mut buffer = HashMap::new();
            while let Some((source_api, candidates)) = futures.next().await {
                if !candidates.is_empty() {
                    buffer.insert(source_api, candidates);
                }
            }
            buffer
        };

        match remaining {
            Some(budget) => tokio::time::timeout(budget, collect).await.ok(),
            None => Some(collect.await),
        }
    }

    /// Rebuild the cross-source aggregate over every stored claim.
    #[instrument(skip(self))]
    pub async fn aggregate(&self) -> Result<AggregateResult> {
        let mut records = Vec::new();
        for source in self.store.list_sources().await? {
            for claim in self.store.claims_for_source(&source.id).await? {
                records.push(ClaimRecord {
                    claim,
                    ingested_at: source.ingested_at,
                });
            }
        }
        Ok(aggregate::aggregate(&records, &self.config))
    }
}
