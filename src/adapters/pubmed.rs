//! PubMed adapter (NCBI E-utilities, no key required).
//!
//! Two-step search: esearch for PMIDs, esummary for titles and dates.
//! Peer-reviewed literature, so `paper` evidence.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{EvidenceCandidate, EvidenceType, SourceApi};

use super::{normalize_candidate, query::build_search_query, EvidenceSource, FetchRequest};

const SEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const SUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";

#[derive(Debug, Deserialize)]
struct EsearchResponse {
    esearchresult: Option<EsearchResult>,
}

#[derive(Debug, Deserialize)]
struct EsearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

pub struct PubmedSource {
    client: reqwest::Client,
    allow: HashSet<String>,
}

impl PubmedSource {
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
        let query = build_search_query(request, 8);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let search: EsearchResponse = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("db", "pubmed"),
                ("term", &query),
                ("retmax", &request.max_results.to_string()),
                ("retmode", "json"),
                ("sort", "relevance"),
            ])
            .send()
            .await
            .context("pubmed esearch request failed")?
            .error_for_status()?
            .json()
            .await
            .context("pubmed esearch response was not JSON")?;

        let ids = search
            .esearchresult
            .map(|r| r.idlist)
            .unwrap_or_default();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let summary: Value = self
            .client
            .get(SUMMARY_URL)
            .query(&[
                ("db", "pubmed"),
                ("id", &ids.join(",")),
                ("retmode", "json"),
            ])
            .send()
            .await
            .context("pubmed esummary request failed")?
            .error_for_status()?
            .json()
            .await
            .context("pubmed esummary response was not JSON")?;

        let result_map = &summary["result"];
        let mut candidates = Vec::new();
        for pmid in ids.iter().take(request.max_results) {
            let info = &result_map[pmid.as_str()];
            let title = info["title"].as_str().unwrap_or("").to_string();
            if title.is_empty() {
                continue;
            }
            let journal = info["fulljournalname"].as_str().unwrap_or("");
            let pubdate = info["pubdate"].as_str().unwrap_or("");
            let snippet = format!("{} ({})", journal, pubdate);
            let published = parse_pubdate(pubdate);
            candidates.push(normalize_candidate(
                SourceApi::Pubmed,
                EvidenceType::Paper,
                title,
                snippet,
                format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid),
                Some(pmid.clone()),
                published,
                &self.allow,
            ));
        }
        Ok(candidates)
    }
}

/// PubMed dates come as "2024 Mar 15", "2024 Mar", or "2024".
fn parse_pubdate(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    let year: i32 = parts.first()?.parse().ok()?;
    let month = parts
        .get(1)
        .and_then(|m| match &m.to_ascii_lowercase()[..3.min(m.len())] {
            "jan" => Some(1),
            "feb" => Some(2),
            "mar" => Some(3),
            "apr" => Some(4),
            "may" => Some(5),
            "jun" => Some(6),
            "jul" => Some(7),
            "aug" => Some(8),
            "sep" => Some(9),
            "oct" => Some(10),
            "nov" => Some(11),
            "dec" => Some(12),
            _ => None,
        })
        .unwrap_or(6);
    let day = parts.get(2).and_then(|d| d.parse().ok()).unwrap_or(15);
    NaiveDate::from_ymd_opt(year, month, day)
}

#[async_trait]
impl EvidenceSource for PubmedSource {
    fn id(&self) -> SourceApi {
        SourceApi::Pubmed
    }

    fn evidence_type(&self) -> EvidenceType {
        EvidenceType::Paper
    }

    async fn fetch(&self, request: &FetchRequest) -> Vec<EvidenceCandidate> {
        match self.search(request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(source = "pubmed", error = %e, "Fetch failed, returning empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pubdate_variants() {
        assert_eq!(
            parse_pubdate("2024 Mar 15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_pubdate("2024 Mar"), NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(parse_pubdate("2024"), NaiveDate::from_ymd_opt(2024, 6, 15));
        assert!(parse_pubdate("").is_none());
    }

    #[test]
    fn test_esearch_parsing() {
        let json = r#"{"esearchresult":{"idlist":["12345","67890"]}}"#;
        let parsed: EsearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.esearchresult.unwrap().idlist.len(), 2);
    }

    #[test]
    fn test_fixed_identity() {
        let source = PubmedSource::new(Duration::from_secs(5), HashSet::new());
        assert_eq!(source.id(), SourceApi::Pubmed);
        assert_eq!(source.evidence_type(), EvidenceType::Paper);
    }
}
