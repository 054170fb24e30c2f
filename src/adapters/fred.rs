//! FRED (Federal Reserve Economic Data) adapter.
//!
//! Macro claims (GDP, inflation, unemployment, rates) map onto well-known
//! series ids; the public `fredgraph.csv` endpoint serves observations with
//! no API key. The latest observation lands in the snippet so the scorer's
//! number matching can bite.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{EvidenceCandidate, EvidenceType, SourceApi};

use super::{normalize_candidate, EvidenceSource, FetchRequest};

const CSV_URL: &str = "https://fred.stlouisfed.org/graph/fredgraph.csv";

/// Macro vocabulary → FRED series id and display name.
const SERIES_MAP: [(&str, &str, &str); 16] = [
    ("gdp growth", "A191RL1Q225SBEA", "Real GDP Growth Rate"),
    ("real gdp", "GDPC1", "Real Gross Domestic Product"),
    ("gdp", "GDP", "Gross Domestic Product"),
    ("inflation", "CPIAUCSL", "Consumer Price Index"),
    ("cpi", "CPIAUCSL", "Consumer Price Index"),
    ("consumer price", "CPIAUCSL", "Consumer Price Index"),
    ("unemployment", "UNRATE", "Unemployment Rate"),
    ("nonfarm payroll", "PAYEMS", "Total Nonfarm Payrolls"),
    ("payrolls", "PAYEMS", "Total Nonfarm Payrolls"),
    ("federal funds rate", "FEDFUNDS", "Federal Funds Effective Rate"),
    ("interest rate", "FEDFUNDS", "Federal Funds Effective Rate"),
    ("treasury yield", "DGS10", "10-Year Treasury Constant Maturity Rate"),
    ("mortgage rate", "MORTGAGE30US", "30-Year Fixed Rate Mortgage Average"),
    ("national debt", "GFDEBTN", "Federal Debt: Total Public Debt"),
    ("federal debt", "GFDEBTN", "Federal Debt: Total Public Debt"),
    ("trade deficit", "BOPGSTB", "Trade Balance: Goods and Services"),
];

fn match_series(claim_text: &str) -> Option<(&'static str, &'static str)> {
    let lower = claim_text.to_lowercase();
    SERIES_MAP
        .iter()
        .find(|(term, _, _)| lower.contains(term))
        .map(|(_, id, name)| (*id, *name))
}

pub struct FredSource {
    client: reqwest::Client,
    allow: HashSet<String>,
}

impl FredSource {
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
        let Some((series_id, series_name)) = match_series(&request.claim_text) else {
            return Ok(Vec::new());
        };

        let csv = self
            .client
            .get(CSV_URL)
            .query(&[("id", series_id)])
            .send()
            .await
            .context("fred csv request failed")?
            .error_for_status()
            .context("fred csv returned error status")?
            .text()
            .await
            .context("fred csv body unreadable")?;

        // Last data line: "YYYY-MM-DD,value".
        let Some((obs_date, obs_value)) = csv
            .lines()
            .rev()
            .filter_map(|line| line.split_once(','))
            .find(|(_, v)| v.parse::<f64>().is_ok())
        else {
            return Ok(Vec::new());
        };

        let published = NaiveDate::parse_from_str(obs_date, "%Y-%m-%d").ok();
        let snippet = format!(
            "{} ({}): observation {} on {}",
            series_name, series_id, obs_value, obs_date
        );
        let candidate = normalize_candidate(
            SourceApi::Fred,
            EvidenceType::Dataset,
            format!("FRED: {}", series_name),
            snippet,
            format!("https://fred.stlouisfed.org/series/{}", series_id),
            Some(series_id.to_string()),
            published,
            &self.allow,
        );
        Ok(vec![candidate])
    }
}

#[async_trait]
impl EvidenceSource for FredSource {
    fn id(&self) -> SourceApi {
        SourceApi::Fred
    }

    fn evidence_type(&self) -> EvidenceType {
        EvidenceType::Dataset
    }

    async fn fetch(&self, request: &FetchRequest) -> Vec<EvidenceCandidate> {
        match self.search(request).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(source = "fred", error = %e, "Fetch failed, returning empty");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_matching() {
        assert_eq!(match_series("GDP grew 2.8% in 2024.").unwrap().0, "GDP");
        assert_eq!(
            match_series("Unemployment hit a record low.").unwrap().0,
            "UNRATE"
        );
        assert_eq!(
            match_series("The federal funds rate held at 5.25 percent.")
                .unwrap()
                .0,
            "FEDFUNDS"
        );
        assert!(match_series("Nothing macroeconomic here.").is_none());
    }

    #[test]
    fn test_more_specific_series_wins() {
        // "gdp growth" must match before the bare "gdp" entry.
        assert_eq!(match_series("GDP growth slowed last year.").unwrap().0, "A191RL1Q225SBEA");
    }

    #[test]
    fn test_fixed_identity() {
        let source = FredSource::new(Duration::from_secs(5), HashSet::new());
        assert_eq!(source.id(), SourceApi::Fred);
        assert_eq!(source.evidence_type(), EvidenceType::Dataset);
    }
}
