//! Crossref adapter (api.crossref.org, no key required).
//!
//! Academic works lookup. Only queried when the claim carries academic
//! vocabulary or multiple named entities — generic claims don't match
//! scholarly metadata and just burn the rate budget.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

use crate::domain::{EvidenceCandidate, EvidenceType, SourceApi};

use super::{normalize_candidate, query::build_search_query, strip_html, EvidenceSource, FetchRequest};

const BASE_URL: &str = "https://api.crossref.org/works";

const ACADEMIC_INDICATORS: [&str; 16] = [
    "study", "studies", "research", "researchers", "published", "paper", "journal",
    "peer-reviewed", "findings", "experiment", "hypothesis", "meta-analysis", "university",
    "professor", "clinical", "randomized",
];

fn has_academic_relevance(request: &FetchRequest) -> bool {
    let lower = request.claim_text.to_lowercase();
    ACADEMIC_INDICATORS.iter().any(|t| lower.contains(t)) || request.entities.len() >= 2
}

#[derive(Debug, Deserialize)]
struct WorksResponse {
    message: Option<WorksMessage>,
}

#[derive(Debug, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<WorkItem>,
}

#[derive(Debug, Deserialize)]
struct WorkItem {
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    published: Option<PublishedDate>,
}

#[derive(Debug, Deserialize)]
struct PublishedDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<i32>>,
}

impl WorkItem {
    fn published_date(&self) -> Option<NaiveDate> {
        let parts = self.published.as_ref()?.date_parts.first()?;
        let year = *parts.first()?;
        let month = parts.get(1).copied().unwrap_or(6) as u32;
        let day = parts.get(2).copied().unwrap_or(15) as u32;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

pub struct CrossrefSource {
    client: reqwest::Client,
    allow: HashSet<String>,
}

impl CrossrefSource {
    pub fn new(timeout: Duration, allow: HashSet<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            allow,
        }
    }

    async fn search(&self, request: &FetchRequest) -> Result<Vec<EvidenceCandidate>> {
        if !has_academic_relevance(request) {
            return Ok(Vec::new());
        }
        let query = build_search_query(request, 8);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let response: WorksResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("query", query.as_str()),
                ("rows", &request.max_results.to_string()),
            ])
            .send()
            .await
            .context("crossref request failed")?
            .error_for_status()
            .context("crossref returned error status")?
            .json()
            .await
            .context("crossref response was not JSON")?;

        let items = response.message.map(|m| m.items).unwrap_or_default();
        Ok(items
            .into_iter()
            .take(request.max_results)
            .filter_map(|item| {
                let title = item.title.first()?.clone();
                let journal = item.container_title.first().cloned().unwrap_or_default();
                let snippet = match &item.abstract_text {
                    Some(abstract_text) => strip_html(abstract_text),
                    None => journal.clone(),
                };
                let url = item.url.clone().or_else(|| {
                    item.doi.as_ref().map(|d| format!("https://doi.org/{}", d))
                })?;
                let published = item.published_date();
                Some(normalize_candidate(
                    SourceApi::Crossref,
                    EvidenceType::Paper,
                    title,
                    snippet,
                    url,
                    item.doi,
                    published,
                    &self.allow,
                ))
            })
            .collect())
    }
}

#[async_trait]
impl EvidenceSource for CrossrefSource {
    fn id(&self) -> SourceApi {
        SourceApi::Crossref
    }

    fn evidence_type(&self) -> EvidenceType {
        EvidenceType::Paper
    }

    async fn fetch(&self, request: &FetchRequest) -> Vec<EvidenceCandidate> {
        match self.search(request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(source = "crossref", error = %e, "Fetch failed, returning empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::Category;

    #[test]
    fn test_academic_prefilter() {
        let config = Config::default();
        let academic = FetchRequest::from_claim(
            "The study found a correlation between diet and heart disease.",
            Category::Health,
            &config,
        );
        assert!(has_academic_relevance(&academic));

        let generic = FetchRequest::from_claim(
            "it went up a lot since then and everyone noticed",
            Category::General,
            &config,
        );
        assert!(!has_academic_relevance(&generic));
    }

    #[test]
    fn test_works_response_parsing() {
        let json = r#"{"message":{"items":[{"title":["Dietary lipids and cardiovascular risk"],"DOI":"10.1000/x","URL":"https://doi.org/10.1000/x","container-title":["The Lancet"],"published":{"date-parts":[[2023,5,10]]}}]}}"#;
        let parsed: WorksResponse = serde_json::from_str(json).unwrap();
        let items = parsed.message.unwrap().items;
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].published_date(),
            NaiveDate::from_ymd_opt(2023, 5, 10)
        );
    }

    #[test]
    fn test_fixed_identity() {
        let source = CrossrefSource::new(Duration::from_secs(5), HashSet::new());
        assert_eq!(source.id(), SourceApi::Crossref);
        assert_eq!(source.evidence_type(), EvidenceType::Paper);
    }
}
