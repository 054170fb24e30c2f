//! Smart routing: pick and order evidence sources per claim.
//!
//! Thirteen content signals are tested against the claim text; each firing
//! signal boosts specific sources. The category's default route supplies the
//! candidate set and base ordering, boosts re-rank it, and the list is
//! capped. The result is a pure function of the claim text, category, and
//! config.

use crate::config::Config;
use crate::domain::{Category, SourceApi};
use crate::extract::classify::keyword_present;
use crate::text::{self, dates, entities, numbers};

/// The thirteen routing signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSignal {
    CompanyMention,
    AcademicLanguage,
    HealthTerm,
    FinancialMetric,
    DrugTerm,
    LaborTerm,
    BudgetTerm,
    DemographicTerm,
    InternationalTerm,
    PatentTerm,
    DatePresent,
    NumberPresent,
    EntityPresent,
}

impl RouteSignal {
    /// Boost applied to each source when this signal fires. Sources absent
    /// from the claim's category route are unaffected.
    fn boosts(&self) -> &'static [(SourceApi, i32)] {
        use SourceApi::*;
        match self {
            RouteSignal::CompanyMention => &[(Yfinance, 3), (SecEdgar, 3), (Wikipedia, 1)],
            RouteSignal::AcademicLanguage => &[(Arxiv, 3), (Crossref, 2), (SemanticScholar, 2)],
            RouteSignal::HealthTerm => &[(Pubmed, 3), (Openfda, 1)],
            RouteSignal::FinancialMetric => &[(Yfinance, 2), (SecEdgar, 2), (Fred, 1)],
            RouteSignal::DrugTerm => &[(Openfda, 3), (Pubmed, 1)],
            RouteSignal::LaborTerm => &[(Bls, 3), (Fred, 1)],
            RouteSignal::BudgetTerm => &[(Cbo, 3), (Usaspending, 2)],
            RouteSignal::DemographicTerm => &[(Census, 3)],
            RouteSignal::InternationalTerm => &[(Worldbank, 3)],
            RouteSignal::PatentTerm => &[(Patentsview, 3)],
            RouteSignal::DatePresent => &[(Fred, 1), (SecEdgar, 1)],
            RouteSignal::NumberPresent => &[(Fred, 1), (Worldbank, 1)],
            RouteSignal::EntityPresent => &[(Wikipedia, 2), (GoogleFactcheck, 1)],
        }
    }
}

/// Minimum keyword hits for each bag-based signal to fire. Broad bags need
/// two hits to avoid firing on incidental vocabulary.
fn min_hits(signal: RouteSignal) -> usize {
    match signal {
        RouteSignal::AcademicLanguage | RouteSignal::HealthTerm | RouteSignal::FinancialMetric => 2,
        _ => 1,
    }
}

fn count_hits(normalized: &str, terms: &[String]) -> usize {
    terms
        .iter()
        .filter(|t| keyword_present(normalized, t))
        .count()
}

/// Detect which routing signals fire for a claim.
pub fn detect_signals(claim_text: &str, config: &Config) -> Vec<RouteSignal> {
    let normalized = text::normalize(claim_text);
    let terms = &config.routing_terms;
    let mut fired = Vec::new();

    let bags: [(RouteSignal, &Vec<String>); 10] = [
        (RouteSignal::CompanyMention, &terms.companies),
        (RouteSignal::AcademicLanguage, &terms.academic),
        (RouteSignal::HealthTerm, &terms.health),
        (RouteSignal::FinancialMetric, &terms.financial_metric),
        (RouteSignal::DrugTerm, &terms.drug),
        (RouteSignal::LaborTerm, &terms.labor),
        (RouteSignal::BudgetTerm, &terms.budget),
        (RouteSignal::DemographicTerm, &terms.demographic),
        (RouteSignal::InternationalTerm, &terms.international),
        (RouteSignal::PatentTerm, &terms.patent),
    ];
    for (signal, bag) in bags {
        if count_hits(&normalized, bag) >= min_hits(signal) {
            fired.push(signal);
        }
    }

    let date_mentions = dates::detect(claim_text);
    if !date_mentions.is_empty() {
        fired.push(RouteSignal::DatePresent);
    }
    if !numbers::detect_significant(claim_text, &date_mentions).is_empty() {
        fired.push(RouteSignal::NumberPresent);
    }
    if !entities::detect(claim_text, &config.entity_allowlist).is_empty() {
        fired.push(RouteSignal::EntityPresent);
    }

    fired
}

/// Produce the ordered source list for a claim.
///
/// The category's first default source survives capping unconditionally.
pub fn route(claim_text: &str, category: Category, config: &Config) -> Vec<SourceApi> {
    let defaults = config.route_for(category);
    if defaults.is_empty() {
        return Vec::new();
    }
    let anchor = defaults[0];

    // Base score preserves the default ordering; boosts re-rank on top.
    let mut scores: Vec<(SourceApi, i32)> = defaults
        .iter()
        .enumerate()
        .map(|(i, s)| (*s, (defaults.len() - i) as i32))
        .collect();

    for signal in detect_signals(claim_text, config) {
        for (source, boost) in signal.boosts() {
            if let Some(entry) = scores.iter_mut().find(|(s, _)| s == source) {
                entry.1 += boost;
            }
        }
    }

    scores.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.order_index().cmp(&b.0.order_index())));

    let mut ordered: Vec<SourceApi> = scores.into_iter().map(|(s, _)| s).collect();
    ordered.truncate(config.max_sources_per_claim);
    if !ordered.contains(&anchor) {
        ordered.pop();
        ordered.push(anchor);
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn test_finance_company_claim_routing() {
        let order = route(
            "Alphabet reported revenue of $96.5 billion in Q4 2024.",
            Category::Finance,
            &config(),
        );
        assert_eq!(order[0], SourceApi::Yfinance);
        assert_eq!(order[1], SourceApi::SecEdgar);
        assert_eq!(order[2], SourceApi::Fred);
        assert!(order.len() <= 6);
    }

    #[test]
    fn test_health_claim_routing() {
        let order = route(
            "LDL cholesterol levels above 160 mg/dL are associated with cardiovascular risk in patients.",
            Category::Health,
            &config(),
        );
        assert_eq!(order[0], SourceApi::Pubmed);
        assert_eq!(order[1], SourceApi::Openfda);
    }

    #[test]
    fn test_cap_at_six() {
        let order = route(
            "The economy grew while unemployment and budget deficits shifted.",
            Category::Finance,
            &config(),
        );
        assert!(order.len() <= 6);
    }

    #[test]
    fn test_anchor_source_survives_capping() {
        let c = config();
        for category in Category::ALL {
            let order = route("Congress passed the budget spending bill on jobs.", category, &c);
            let anchor = c.route_for(category)[0];
            assert!(order.contains(&anchor), "anchor lost for {:?}", category);
        }
    }

    #[test]
    fn test_routing_is_deterministic() {
        let c = config();
        let text = "Nvidia announced a new GPU with 2x inference throughput in 2025.";
        let a = route(text, Category::Tech, &c);
        let b = route(text, Category::Tech, &c);
        assert_eq!(a, b);
    }

    #[test]
    fn test_signals_fire_for_company_claim() {
        let fired = detect_signals("Alphabet reported revenue of $96.5 billion.", &config());
        assert!(fired.contains(&RouteSignal::CompanyMention));
        assert!(fired.contains(&RouteSignal::NumberPresent));
        assert!(fired.contains(&RouteSignal::EntityPresent));
    }

    #[test]
    fn test_labor_signal_boosts_bls() {
        let order = route(
            "Nonfarm payrolls added 250,000 jobs as hiring accelerated.",
            Category::Labor,
            &config(),
        );
        assert_eq!(order[0], SourceApi::Bls);
    }

    #[test]
    fn test_general_claim_keeps_default_order() {
        let order = route("Someone mentioned something plain without facts.", Category::General, &config());
        let defaults = config();
        let expected = defaults.route_for(Category::General);
        assert_eq!(order[0], expected[0]);
    }
}
