//! Wikipedia adapter (MediaWiki Action API, no key required).
//!
//! Good for entity-level facts: company profiles, bios, historical events.
//! Always `secondary` evidence — it can raise a claim to PARTIAL but never
//! to SUPPORTED.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::domain::{EvidenceCandidate, EvidenceType, SourceApi};

use super::{normalize_candidate, query::build_search_query, strip_html, EvidenceSource, FetchRequest};

const SEARCH_URL: &str = "https://en.wikipedia.org/w/api.php";
const USER_AGENT: &str = "veritas/0.1 (research tool)";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    snippet: String,
    pageid: u64,
}

pub struct WikipediaSource {
    client: reqwest::Client,
    allow: HashSet<String>,
}

impl WikipediaSource {
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

        let response: SearchResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", &query),
                ("srlimit", &request.max_results.to_string()),
                ("format", "json"),
                ("utf8", "1"),
            ])
            .send()
            .await
            .context("wikipedia search request failed")?
            .error_for_status()
            .context("wikipedia search returned error status")?
            .json()
            .await
            .context("wikipedia search response was not JSON")?;

        let hits = response.query.map(|q| q.search).unwrap_or_default();
        Ok(hits
            .into_iter()
            .take(request.max_results)
            .map(|hit| {
                let url = format!(
                    "https://en.wikipedia.org/wiki/{}",
                    hit.title.replace(' ', "_")
                );
                normalize_candidate(
                    SourceApi::Wikipedia,
                    EvidenceType::Secondary,
                    hit.title,
                    strip_html(&hit.snippet),
                    url,
                    Some(hit.pageid.to_string()),
                    None,
                    &self.allow,
                )
            })
            .collect())
    }
}

#[async_trait]
impl EvidenceSource for WikipediaSource {
    fn id(&self) -> SourceApi {
        SourceApi::Wikipedia
    }

    fn evidence_type(&self) -> EvidenceType {
        EvidenceType::Secondary
    }

    async fn fetch(&self, request: &FetchRequest) -> Vec<EvidenceCandidate> {
        match self.search(request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(source = "wikipedia", error = %e, "Fetch failed, returning empty");
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
        let source = WikipediaSource::new(Duration::from_secs(5), HashSet::new());
        assert_eq!(source.id(), SourceApi::Wikipedia);
        assert_eq!(source.evidence_type(), EvidenceType::Secondary);
    }

    #[test]
    fn test_search_response_parsing() {
        let json = r#"{"query":{"search":[{"title":"Alphabet Inc.","snippet":"<span>Alphabet</span> reported revenue","pageid":12345}]}}"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let hits = parsed.query.unwrap().search;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pageid, 12345);
    }
}
