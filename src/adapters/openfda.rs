//! OpenFDA adapter (no key required).
//!
//! The endpoint is picked from claim vocabulary: approvals hit drugsfda,
//! recalls hit enforcement, labels hit drug/label. Regulatory data, so
//! `gov` evidence.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::domain::{EvidenceCandidate, EvidenceType, SourceApi};

use super::{normalize_candidate, query::build_search_query, EvidenceSource, FetchRequest};

const BASE_URL: &str = "https://api.fda.gov";

const ENDPOINTS: [(&str, &str); 6] = [
    ("recall", "/food/enforcement.json"),
    ("recalled", "/food/enforcement.json"),
    ("approved", "/drug/drugsfda.json"),
    ("approval", "/drug/drugsfda.json"),
    ("label", "/drug/label.json"),
    ("warning", "/drug/label.json"),
];

fn pick_endpoint(claim_text: &str) -> &'static str {
    let lower = claim_text.to_lowercase();
    ENDPOINTS
        .iter()
        .find(|(kw, _)| lower.contains(kw))
        .map(|(_, ep)| *ep)
        // Adverse events is the largest dataset.
        .unwrap_or("/drug/event.json")
}

pub struct OpenFdaSource {
    client: reqwest::Client,
    allow: HashSet<String>,
}

impl OpenFdaSource {
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
        let query = build_search_query(request, 6);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let endpoint = pick_endpoint(&request.claim_text);

        let body: Value = self
            .client
            .get(format!("{}{}", BASE_URL, endpoint))
            .query(&[
                ("search", query.as_str()),
                ("limit", &request.max_results.to_string()),
            ])
            .send()
            .await
            .context("openfda request failed")?
            .error_for_status()
            .context("openfda returned error status")?
            .json()
            .await
            .context("openfda response was not JSON")?;

        let Some(results) = body["results"].as_array() else {
            return Ok(Vec::new());
        };

        Ok(results
            .iter()
            .take(request.max_results)
            .enumerate()
            .map(|(i, result)| {
                let (title, snippet) = describe_result(endpoint, result);
                normalize_candidate(
                    SourceApi::Openfda,
                    EvidenceType::Gov,
                    title,
                    snippet,
                    format!("https://open.fda.gov/apis{}#{}", endpoint, i),
                    None,
                    None,
                    &self.allow,
                )
            })
            .collect())
    }
}

/// Pull a readable title/snippet out of the endpoint-specific shapes.
fn describe_result(endpoint: &str, result: &Value) -> (String, String) {
    if endpoint.contains("enforcement") {
        let product = result["product_description"].as_str().unwrap_or("FDA recall");
        let reason = result["reason_for_recall"].as_str().unwrap_or("");
        (format!("FDA enforcement: {}", truncate(product, 80)), reason.to_string())
    } else if endpoint.contains("drugsfda") {
        let brand = result["products"][0]["brand_name"]
            .as_str()
            .unwrap_or("FDA drug application");
        let number = result["application_number"].as_str().unwrap_or("");
        (format!("FDA application: {}", brand), number.to_string())
    } else if endpoint.contains("label") {
        let brand = result["openfda"]["brand_name"][0]
            .as_str()
            .unwrap_or("FDA drug label");
        let purpose = result["purpose"][0].as_str().unwrap_or("");
        (format!("FDA label: {}", brand), truncate(purpose, 200).to_string())
    } else {
        let drug = result["patient"]["drug"][0]["medicinalproduct"]
            .as_str()
            .unwrap_or("FDA adverse event report");
        (format!("FDA adverse event: {}", drug), String::new())
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl EvidenceSource for OpenFdaSource {
    fn id(&self) -> SourceApi {
        SourceApi::Openfda
    }

    fn evidence_type(&self) -> EvidenceType {
        EvidenceType::Gov
    }

    async fn fetch(&self, request: &FetchRequest) -> Vec<EvidenceCandidate> {
        match self.search(request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(source = "openfda", error = %e, "Fetch failed, returning empty");
                Vec::new()
            }
        }
    }
}
