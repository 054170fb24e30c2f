//! Static configuration: lexicons, category keywords, routing tables, and
//! scoring weights.
//!
//! The whole configuration is read-only after startup and threaded
//! explicitly through component constructors. Defaults live here; a YAML
//! file can override any subset. Missing or degenerate lexicons fail fast
//! with [`ConfigError`].

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Category, EvidenceType, SourceApi};

/// Configuration validation failure. Raised at startup, never mid-run.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("lexicon '{0}' is empty")]
    EmptyLexicon(&'static str),

    #[error("category '{0}' has no default route")]
    MissingRoute(String),

    #[error("category '{0}' has no evidence-type weights")]
    MissingWeights(String),

    #[error("threshold '{name}' out of range: {value}")]
    BadThreshold { name: &'static str, value: f64 },
}

/// Keyword bags driving the router's thirteen content signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingTerms {
    pub companies: Vec<String>,
    pub academic: Vec<String>,
    pub health: Vec<String>,
    pub financial_metric: Vec<String>,
    pub drug: Vec<String>,
    pub labor: Vec<String>,
    pub budget: Vec<String>,
    pub demographic: Vec<String>,
    pub international: Vec<String>,
    pub patent: Vec<String>,
}

impl Default for RoutingTerms {
    fn default() -> Self {
        Self {
            companies: to_strings(&[
                "apple", "microsoft", "google", "alphabet", "amazon", "meta", "facebook", "tesla",
                "nvidia", "netflix", "intel", "amd", "ibm", "oracle", "salesforce",
                "goldman sachs", "jpmorgan", "morgan stanley", "boeing", "walmart", "disney",
                "openai", "deepmind", "stripe", "spacex", "bytedance", "tiktok",
            ]),
            academic: to_strings(&[
                "study", "studies", "research", "researchers", "published", "journal",
                "peer-reviewed", "paper", "findings", "experiment", "hypothesis", "methodology",
                "statistical", "correlation", "meta-analysis", "university", "professor", "phd",
            ]),
            health: to_strings(&[
                "patients", "clinical", "trial", "trials", "treatment", "therapy", "diagnosis",
                "symptoms", "disease", "drug", "fda", "vaccine", "mortality", "survival",
                "dosage", "placebo", "double-blind", "randomized", "cholesterol", "ldl",
            ]),
            financial_metric: to_strings(&[
                "revenue", "revenues", "earnings", "income", "profit", "margin", "eps",
                "market cap", "stock price", "share price", "dividend", "valuation", "billion",
                "million", "quarter", "quarterly", "annual", "operating", "capex", "cash flow",
                "balance sheet", "debt", "equity", "ipo", "gdp", "inflation", "interest rate",
            ]),
            drug: to_strings(&[
                "drug", "fda", "adverse", "recall", "recalled", "approved", "approval",
                "pharmaceutical", "side effect", "medication", "dosage", "prescription", "label",
            ]),
            labor: to_strings(&[
                "jobs", "employment", "unemployment", "labor", "payroll", "payrolls", "wages",
                "workforce", "hiring", "layoffs", "job openings", "labor force", "nonfarm",
            ]),
            budget: to_strings(&[
                "spending", "budget", "deficit", "surplus", "national debt", "federal debt",
                "appropriation", "entitlement", "social security", "medicare", "medicaid",
                "stimulus", "contract", "grant", "federal spending", "pentagon",
            ]),
            demographic: to_strings(&[
                "population", "census", "demographic", "demographics", "median income",
                "household income", "poverty", "poverty rate", "homeownership", "uninsured",
                "health insurance",
            ]),
            international: to_strings(&[
                "global", "world", "international", "developing", "developed", "exports",
                "imports", "foreign aid", "external debt", "gini", "life expectancy",
                "infant mortality", "literacy", "co2 emissions", "carbon emissions",
            ]),
            patent: to_strings(&[
                "patent", "patents", "patented", "invention", "innovation",
                "intellectual property", "patent filing", "trademark",
            ]),
        }
    }
}

/// Immutable engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Extraction lexicons
    pub assertion_verbs: HashSet<String>,
    pub hedge_words: Vec<String>,
    pub boilerplate: Vec<String>,
    pub leading_conjunctions: HashSet<String>,
    pub subject_pronouns: HashSet<String>,
    pub abbreviations: HashSet<String>,
    /// Known entities, lowercased. Catches names at sentence start.
    pub entity_allowlist: HashSet<String>,

    /// Per-category keyword bags for classification, in priority order.
    pub category_keywords: Vec<(Category, Vec<String>)>,

    // Routing
    pub routing_terms: RoutingTerms,
    pub default_routes: Vec<(Category, Vec<SourceApi>)>,
    /// Hard cap on sources queried per claim.
    pub max_sources_per_claim: usize,

    // Scoring
    pub evidence_type_weights: Vec<(Category, Vec<(EvidenceType, i32)>)>,
    /// Categories penalized for stale evidence.
    pub time_sensitive: HashSet<Category>,

    // Thresholds
    pub dedup_threshold: f64,
    pub fuzzy_group_threshold: f64,

    // Adapter / orchestrator limits
    pub max_results_per_source: usize,
    pub fetch_timeout_secs: u64,
    pub fetch_concurrency: usize,
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn to_string_set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        use Category::*;
        use EvidenceType::*;
        use SourceApi::*;

        Self {
            assertion_verbs: to_string_set(&[
                "is", "are", "was", "were", "has", "have", "had", "said", "says", "reported",
                "reports", "announced", "announces", "grew", "fell", "rose", "totaled", "reached",
                "shows", "show", "showed", "confirms", "confirm", "confirmed", "found", "reveals",
                "reveal", "revealed", "means", "will", "causes", "cause", "caused", "leads",
                "led", "released", "proved", "proves", "demonstrates", "established", "increased",
                "decreased", "declined", "dropped", "gained", "hit", "recorded", "posted",
                "earned", "raised", "cut", "approved", "launched", "filed",
            ]),
            hedge_words: to_strings(&[
                "might", "may", "could", "possibly", "likely", "appears", "suggests", "suggest",
                "perhaps", "probably", "seemingly", "reportedly", "allegedly", "around",
                "roughly", "approximately", "some say",
            ]),
            boilerplate: to_strings(&[
                "like and subscribe", "hit the bell", "leave a comment", "link in the description",
                "sponsored by", "thanks for watching", "smash that", "don't forget to subscribe",
                "follow me on", "check out my", "patreon",
            ]),
            leading_conjunctions: to_string_set(&[
                "and", "but", "or", "so", "because", "although", "while", "though", "yet",
            ]),
            subject_pronouns: to_string_set(&[
                "i", "we", "it", "they", "he", "she", "you", "this", "that", "these", "those",
                "there",
            ]),
            abbreviations: to_string_set(&[
                "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "St.", "Inc.", "Corp.",
                "Ltd.", "Co.", "vs.", "etc.", "e.g.", "i.e.", "U.S.", "U.K.", "U.N.", "No.",
                "Fig.", "approx.",
            ]),
            entity_allowlist: to_string_set(&[
                "alphabet", "google", "microsoft", "apple", "amazon", "meta", "nvidia", "tesla",
                "openai", "netflix", "intel", "ibm", "oracle", "boeing", "walmart",
                "goldman sachs", "jpmorgan", "morgan stanley", "federal reserve", "treasury",
                "congress", "senate", "pentagon", "nato", "nasa", "fda", "sec", "cdc", "who",
                "world bank", "imf", "united nations", "european central bank", "white house",
            ]),
            category_keywords: vec![
                (
                    Finance,
                    to_strings(&[
                        "revenue", "revenues", "earnings", "gaap", "eps", "market cap", "fiscal",
                        "sec", "rate", "rates", "inflation", "gdp", "deficit", "debt", "bond",
                        "bonds", "stock", "stocks", "market", "markets", "fed", "federal reserve",
                        "treasury", "bank", "banks", "economy", "economic", "recession",
                        "monetary", "yield", "dollar", "interest", "investment", "investors",
                        "profit", "profits", "billion", "trillion", "margin", "margins", "capex",
                        "quarterly", "guidance", "dividend", "dividends", "buyback", "valuation",
                        "equity", "shares", "ipo", "10-k", "10-q", "filing", "filings",
                    ]),
                ),
                (
                    Health,
                    to_strings(&[
                        "health", "healthcare", "hospital", "disease", "vaccine", "pandemic",
                        "drug", "drugs", "fda", "clinical", "patient", "patients", "medical",
                        "cancer", "treatment", "diagnosis", "mortality", "pharmaceutical",
                        "cholesterol", "blood pressure", "trial", "trials", "diet", "obesity",
                        "heart", "stroke", "diabetes", "medicine", "doctor", "doctors",
                        "surgery", "symptoms", "infection", "therapy", "ldl", "hdl",
                        "cardiovascular", "placebo", "randomized", "double-blind",
                    ]),
                ),
                (
                    Science,
                    to_strings(&[
                        "research", "study", "experiment", "discovery", "nasa", "space",
                        "physics", "biology", "genome", "species", "cells", "immune", "bacteria",
                        "virus", "protein", "dna", "rna", "scientist", "scientists",
                        "researchers", "published", "journal", "peer-reviewed", "findings",
                        "hypothesis", "university", "professor", "laboratory", "evolution",
                        "astronomy", "telescope", "planet", "galaxy", "chemistry", "molecule",
                        "correlation", "statistical",
                    ]),
                ),
                (
                    Tech,
                    to_strings(&[
                        "ai", "artificial intelligence", "machine learning", "gpu", "chip",
                        "chips", "semiconductor", "software", "algorithm", "model", "neural",
                        "robot", "robotics", "autonomous", "cloud", "computing", "startup",
                        "github", "open source", "training", "inference", "llm", "transformer",
                        "api", "technology", "platform", "digital", "internet", "server",
                        "database", "processor", "cpu", "hardware", "encryption", "blockchain",
                        "crypto", "bitcoin", "app", "code", "programming", "developer", "quantum",
                    ]),
                ),
                (
                    Politics,
                    to_strings(&[
                        "president", "congress", "senate", "house", "vote", "voted", "election",
                        "democrat", "democrats", "republican", "republicans", "legislation",
                        "law", "policy", "government", "administration", "cabinet",
                        "supreme court", "constitutional", "bill", "bipartisan", "partisan",
                        "campaign", "governor", "mayor", "political", "politics", "regulation",
                        "regulations", "federal",
                    ]),
                ),
                (
                    Military,
                    to_strings(&[
                        "military", "defense", "army", "navy", "war", "weapon", "weapons",
                        "missile", "nuclear", "nato", "pentagon", "troops", "combat", "drone",
                        "drones", "intelligence", "security", "sanctions",
                    ]),
                ),
                (
                    Education,
                    to_strings(&[
                        "school", "schools", "student", "students", "teacher", "teachers",
                        "education", "tuition", "college", "colleges", "degree", "enrollment",
                        "graduation", "curriculum", "literacy", "kindergarten", "classroom",
                        "scholarship",
                    ]),
                ),
                (
                    EnergyClimate,
                    to_strings(&[
                        "climate", "temperature", "emissions", "carbon", "energy", "solar",
                        "wind", "renewable", "renewables", "coal", "oil", "gas", "warming",
                        "greenhouse", "co2", "grid", "battery", "batteries", "fossil",
                        "megawatt", "gigawatt",
                    ]),
                ),
                (
                    Labor,
                    to_strings(&[
                        "jobs", "employment", "unemployment", "labor", "labour", "payroll",
                        "payrolls", "wages", "workforce", "hiring", "layoffs", "workers",
                        "strike", "union", "unions", "nonfarm", "job openings",
                    ]),
                ),
                (General, Vec::new()),
            ],
            routing_terms: RoutingTerms::default(),
            default_routes: vec![
                (
                    Finance,
                    vec![
                        Yfinance, SecEdgar, Fred, Bls, Cbo, Usaspending, GoogleFactcheck,
                        Crossref, Wikipedia,
                    ],
                ),
                (Health, vec![Pubmed, Openfda, GoogleFactcheck, Crossref, Wikipedia]),
                (Science, vec![Arxiv, Crossref, Pubmed, Worldbank, Wikipedia]),
                (Tech, vec![Arxiv, Crossref, Patentsview, GoogleFactcheck, Wikipedia]),
                (Politics, vec![GoogleFactcheck, Cbo, Usaspending, Crossref, Wikipedia]),
                (Military, vec![GoogleFactcheck, Usaspending, Crossref, Wikipedia]),
                (Education, vec![Census, Worldbank, Crossref, GoogleFactcheck, Wikipedia]),
                (
                    EnergyClimate,
                    vec![Worldbank, Crossref, Arxiv, GoogleFactcheck, Wikipedia],
                ),
                (Labor, vec![Bls, Fred, Census, GoogleFactcheck, Crossref, Wikipedia]),
                (General, vec![GoogleFactcheck, Wikipedia, Crossref, Arxiv, Bls, Census]),
            ],
            max_sources_per_claim: 6,
            evidence_type_weights: vec![
                (Finance, vec![(Filing, 10), (Dataset, 8), (Gov, 8), (Factcheck, 5), (Paper, 3), (Secondary, 2)]),
                (Health, vec![(Paper, 10), (Gov, 9), (Factcheck, 6), (Dataset, 6), (Filing, 2), (Secondary, 2)]),
                (Science, vec![(Paper, 10), (Dataset, 7), (Gov, 6), (Factcheck, 5), (Filing, 2), (Secondary, 2)]),
                (Tech, vec![(Paper, 8), (Filing, 6), (Dataset, 5), (Gov, 5), (Factcheck, 5), (Secondary, 2)]),
                (Politics, vec![(Factcheck, 10), (Gov, 8), (Dataset, 7), (Paper, 4), (Filing, 3), (Secondary, 2)]),
                (Military, vec![(Gov, 9), (Factcheck, 8), (Dataset, 6), (Paper, 4), (Filing, 2), (Secondary, 2)]),
                (Education, vec![(Dataset, 9), (Gov, 8), (Paper, 6), (Factcheck, 5), (Filing, 2), (Secondary, 2)]),
                (EnergyClimate, vec![(Dataset, 9), (Paper, 8), (Gov, 7), (Factcheck, 5), (Filing, 3), (Secondary, 2)]),
                (Labor, vec![(Dataset, 10), (Gov, 8), (Factcheck, 5), (Paper, 4), (Filing, 3), (Secondary, 2)]),
                (General, vec![(Factcheck, 7), (Gov, 6), (Dataset, 6), (Paper, 5), (Filing, 4), (Secondary, 2)]),
            ],
            time_sensitive: [Finance, Politics, Labor].into_iter().collect(),
            dedup_threshold: 0.85,
            fuzzy_group_threshold: 0.85,
            max_results_per_source: 5,
            fetch_timeout_secs: 10,
            fetch_concurrency: 4,
        }
    }
}

impl Config {
    /// Load configuration, applying YAML overrides from `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file: {}", p.display()))?;
                serde_yaml::from_str(&content).context("Failed to parse config YAML")?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on missing or degenerate lexicons.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assertion_verbs.is_empty() {
            return Err(ConfigError::EmptyLexicon("assertion_verbs"));
        }
        if self.hedge_words.is_empty() {
            return Err(ConfigError::EmptyLexicon("hedge_words"));
        }
        if self.leading_conjunctions.is_empty() {
            return Err(ConfigError::EmptyLexicon("leading_conjunctions"));
        }
        if self.subject_pronouns.is_empty() {
            return Err(ConfigError::EmptyLexicon("subject_pronouns"));
        }
        if self.category_keywords.is_empty() {
            return Err(ConfigError::EmptyLexicon("category_keywords"));
        }

        for (name, value) in [
            ("dedup_threshold", self.dedup_threshold),
            ("fuzzy_group_threshold", self.fuzzy_group_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::BadThreshold { name, value });
            }
        }

        for category in Category::ALL {
            if !self.default_routes.iter().any(|(c, _)| *c == category) {
                return Err(ConfigError::MissingRoute(category.as_str().to_string()));
            }
            if !self
                .evidence_type_weights
                .iter()
                .any(|(c, _)| *c == category)
            {
                return Err(ConfigError::MissingWeights(category.as_str().to_string()));
            }
        }

        Ok(())
    }

    /// Default source order for a category.
    pub fn route_for(&self, category: Category) -> &[SourceApi] {
        self.default_routes
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, route)| route.as_slice())
            .unwrap_or(&[])
    }

    /// Evidence-type weight for a category.
    pub fn evidence_weight(&self, category: Category, evidence_type: EvidenceType) -> i32 {
        self.evidence_type_weights
            .iter()
            .find(|(c, _)| *c == category)
            .and_then(|(_, weights)| {
                weights
                    .iter()
                    .find(|(t, _)| *t == evidence_type)
                    .map(|(_, w)| *w)
            })
            .unwrap_or(0)
    }

    /// Keyword bag for a category.
    pub fn keywords_for(&self, category: Category) -> &[String] {
        self.category_keywords
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, kw)| kw.as_slice())
            .unwrap_or(&[])
    }

    /// Store root directory ($VERITAS_HOME or ~/.veritas).
    pub fn home_dir() -> Result<std::path::PathBuf> {
        if let Ok(home) = std::env::var("VERITAS_HOME") {
            return Ok(std::path::PathBuf::from(home));
        }
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(".veritas"))
    }
}
