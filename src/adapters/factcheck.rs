//! Google Fact Check Tools adapter (claims:search endpoint).
//!
//! Fact-checker verdicts from verified publishers (PolitiFact, Snopes, AFP,
//! Reuters). Accredited fact-checks count as primary evidence under the
//! `factcheck` type.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use crate::domain::{EvidenceCandidate, EvidenceType, SourceApi};

use super::{normalize_candidate, query::build_search_query, EvidenceSource, FetchRequest};

const SEARCH_URL: &str = "https://factchecktools.googleapis.com/v1alpha1/claims:search";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimsResponse {
    #[serde(default)]
    claims: Vec<FactClaim>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FactClaim {
    #[serde(default)]
    text: String,
    #[serde(default)]
    claim_review: Vec<ClaimReview>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimReview {
    publisher: Option<Publisher>,
    url: Option<String>,
    title: Option<String>,
    textual_rating: Option<String>,
    review_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Publisher {
    name: Option<String>,
}

pub struct FactcheckSource {
    client: reqwest::Client,
    allow: HashSet<String>,
    api_key: Option<String>,
}

impl FactcheckSource {
    pub fn new(timeout: Duration, allow: HashSet<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            allow,
            api_key: std::env::var("VERITAS_FACTCHECK_KEY").ok(),
        }
    }

    async fn search(&self, request: &FetchRequest) -> Result<Vec<EvidenceCandidate>> {
        // The claims:search endpoint requires a key; without one the adapter
        // is a silent no-op rather than a failure.
        let Some(key) = &self.api_key else {
            return Ok(Vec::new());
        };
        let query = build_search_query(request, 10);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let response: ClaimsResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("query", query.as_str()),
                ("pageSize", &request.max_results.to_string()),
                ("key", key.as_str()),
            ])
            .send()
            .await
            .context("factcheck request failed")?
            .error_for_status()
            .context("factcheck returned error status")?
            .json()
            .await
            .context("factcheck response was not JSON")?;

        Ok(response
            .claims
            .into_iter()
            .take(request.max_results)
            .filter_map(|claim| {
                let review = claim.claim_review.into_iter().next()?;
                let url = review.url?;
                let publisher = review
                    .publisher
                    .and_then(|p| p.name)
                    .unwrap_or_else(|| "fact checker".to_string());
                let rating = review.textual_rating.unwrap_or_default();
                let title = review
                    .title
                    .unwrap_or_else(|| format!("{}: {}", publisher, rating));
                let snippet = format!("{} rated \"{}\": {}", publisher, rating, claim.text);
                let published = review
                    .review_date
                    .as_deref()
                    .and_then(|d| NaiveDate::parse_from_str(&d[..10.min(d.len())], "%Y-%m-%d").ok());
                Some(normalize_candidate(
                    SourceApi::GoogleFactcheck,
                    EvidenceType::Factcheck,
                    title,
                    snippet,
                    url,
                    None,
                    published,
                    &self.allow,
                ))
            })
            .collect())
    }
}

#[async_trait]
impl EvidenceSource for FactcheckSource {
    fn id(&self) -> SourceApi {
        SourceApi::GoogleFactcheck
    }

    fn evidence_type(&self) -> EvidenceType {
        EvidenceType::Factcheck
    }

    async fn fetch(&self, request: &FetchRequest) -> Vec<EvidenceCandidate> {
        match self.search(request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(source = "google_factcheck", error = %e, "Fetch failed, returning empty");
                Vec::new()
            }
        }
    }
}
