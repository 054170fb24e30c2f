//! SEC EDGAR full-text search adapter (EFTS, no key required).
//!
//! Filings (10-K, 10-Q, 8-K) are the strongest evidence for company
//! financial claims. The SEC requires a descriptive User-Agent.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use crate::domain::{EvidenceCandidate, EvidenceType, SourceApi};

use super::{normalize_candidate, query::build_search_query, EvidenceSource, FetchRequest};

const SEARCH_URL: &str = "https://efts.sec.gov/LATEST/search-index";
// SEC asks for "Company AdminContact@domain" in the User-Agent.
const USER_AGENT: &str = "veritas research@veritas.local";

#[derive(Debug, Deserialize)]
struct EftsResponse {
    hits: Option<EftsHits>,
}

#[derive(Debug, Deserialize)]
struct EftsHits {
    hits: Vec<EftsHit>,
}

#[derive(Debug, Deserialize)]
struct EftsHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: EftsSource,
}

#[derive(Debug, Deserialize)]
struct EftsSource {
    #[serde(default)]
    display_names: Vec<String>,
    #[serde(default)]
    file_date: String,
    #[serde(default)]
    file_type: String,
}

pub struct SecEdgarSource {
    client: reqwest::Client,
    allow: HashSet<String>,
}

impl SecEdgarSource {
    pub fn new(timeout: Duration, allow: HashSet<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
            allow,
        }
    }

    async fn search(&self, request: &FetchRequest) -> Result<Vec<EvidenceCandidate>> {
        let query = build_search_query(request, 8);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let response: EftsResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[("q", query.as_str()), ("forms", "10-K,10-Q,8-K")])
            .send()
            .await
            .context("edgar search request failed")?
            .error_for_status()
            .context("edgar search returned error status")?
            .json()
            .await
            .context("edgar search response was not JSON")?;

        let hits = response.hits.map(|h| h.hits).unwrap_or_default();
        Ok(hits
            .into_iter()
            .take(request.max_results)
            .map(|hit| {
                let filer = hit
                    .source
                    .display_names
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "SEC filer".to_string());
                let form = if hit.source.file_type.is_empty() {
                    "filing".to_string()
                } else {
                    hit.source.file_type.clone()
                };
                let title = format!("{} Form {}", filer, form);
                let snippet = format!("{} filed {} on {}", filer, form, hit.source.file_date);
                let url = format!(
                    "https://www.sec.gov/cgi-bin/browse-edgar?action=getcompany&filenum={}",
                    hit.id
                );
                let published =
                    NaiveDate::parse_from_str(&hit.source.file_date, "%Y-%m-%d").ok();
                normalize_candidate(
                    SourceApi::SecEdgar,
                    EvidenceType::Filing,
                    title,
                    snippet,
                    url,
                    Some(hit.id),
                    published,
                    &self.allow,
                )
            })
            .collect())
    }
}

#[async_trait]
impl EvidenceSource for SecEdgarSource {
    fn id(&self) -> SourceApi {
        SourceApi::SecEdgar
    }

    fn evidence_type(&self) -> EvidenceType {
        EvidenceType::Filing
    }

    async fn fetch(&self, request: &FetchRequest) -> Vec<EvidenceCandidate> {
        match self.search(request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(source = "sec_edgar", error = %e, "Fetch failed, returning empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_identity() {
        let source = SecEdgarSource::new(Duration::from_secs(5), HashSet::new());
        assert_eq!(source.id(), SourceApi::SecEdgar);
        assert_eq!(source.evidence_type(), EvidenceType::Filing);
    }

    #[test]
    fn test_efts_response_parsing() {
        let json = r#"{"hits":{"hits":[{"_id":"0001652044-25-000014:goog-10k.htm","_source":{"display_names":["Alphabet Inc. (GOOGL)"],"file_date":"2025-01-30","file_type":"10-K"}}]}}"#;
        let parsed: EftsResponse = serde_json::from_str(json).unwrap();
        let hits = parsed.hits.unwrap().hits;
        assert_eq!(hits[0].source.file_date, "2025-01-30");
        assert_eq!(hits[0].source.display_names[0], "Alphabet Inc. (GOOGL)");
    }
}
