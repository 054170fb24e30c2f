//! Evidence-source adapters.
//!
//! Each adapter implements one operation: fetch evidence candidates for a
//! claim. Adapters absorb every failure — timeout, rate limit, HTTP error,
//! parse error — and return an empty list; nothing propagates into the
//! orchestrator. The registry owns a token bucket per adapter and enforces
//! the per-call timeout.

pub mod crossref;
pub mod factcheck;
pub mod fred;
pub mod openfda;
pub mod pubmed;
pub mod query;
pub mod sec_edgar;
pub mod wikipedia;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::Config;
use crate::domain::{Category, EvidenceCandidate, EvidenceType, SourceApi};
use crate::text::{self, dates::DateMention, entities, numbers, numbers::NumberMention};

pub use crossref::CrossrefSource;
pub use factcheck::FactcheckSource;
pub use fred::FredSource;
pub use openfda::OpenFdaSource;
pub use pubmed::PubmedSource;
pub use sec_edgar::SecEdgarSource;
pub use wikipedia::WikipediaSource;

/// Everything an adapter may use to build its query.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub claim_text: String,
    pub entities: Vec<String>,
    pub numbers: Vec<NumberMention>,
    pub dates: Vec<DateMention>,
    pub category: Category,
    pub max_results: usize,
}

impl FetchRequest {
    /// Build a request from claim text by running the shared detectors.
    pub fn from_claim(claim_text: &str, category: Category, config: &Config) -> Self {
        let date_mentions = text::dates::detect(claim_text);
        let number_mentions = numbers::detect_significant(claim_text, &date_mentions);
        let entity_mentions = entities::detect(claim_text, &config.entity_allowlist);
        Self {
            claim_text: claim_text.to_string(),
            entities: entity_mentions.into_iter().map(|e| e.text).collect(),
            numbers: number_mentions,
            dates: date_mentions,
            category,
            max_results: config.max_results_per_source,
        }
    }
}

/// A single evidence-source API.
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Stable source id used by the router.
    fn id(&self) -> SourceApi;

    /// Fixed evidence type for everything this source returns.
    fn evidence_type(&self) -> EvidenceType;

    /// Fetch up to `request.max_results` candidates. Must return an empty
    /// list on any failure, never an error.
    async fn fetch(&self, request: &FetchRequest) -> Vec<EvidenceCandidate>;
}

/// Token bucket: `burst` capacity, `refill_per_sec` tokens per second.
/// Exhaustion makes the fetch return empty rather than block.
pub struct RateLimiter {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<(f64, Instant)>,
}

impl RateLimiter {
    pub fn new(refill_per_sec: f64, burst: u32) -> Self {
        Self {
            capacity: burst as f64,
            refill_per_sec,
            state: Mutex::new((burst as f64, Instant::now())),
        }
    }

    /// Take one token if available.
    pub async fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(state.1).as_secs_f64();
        state.0 = (state.0 + elapsed * self.refill_per_sec).min(self.capacity);
        state.1 = now;
        if state.0 >= 1.0 {
            state.0 -= 1.0;
            true
        } else {
            false
        }
    }
}

struct Registered {
    adapter: Box<dyn EvidenceSource>,
    limiter: RateLimiter,
}

/// Flat registry mapping source ids to adapters.
pub struct AdapterRegistry {
    entries: HashMap<SourceApi, Registered>,
    timeout: Duration,
}

impl AdapterRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            timeout,
        }
    }

    /// Registry with every built-in HTTP adapter.
    pub fn with_defaults(config: &Config) -> Self {
        let timeout = Duration::from_secs(config.fetch_timeout_secs);
        let mut registry = Self::new(timeout);
        let allow = config.entity_allowlist.clone();
        registry.register(Box::new(SecEdgarSource::new(timeout, allow.clone())));
        registry.register(Box::new(FredSource::new(timeout, allow.clone())));
        registry.register(Box::new(PubmedSource::new(timeout, allow.clone())));
        registry.register(Box::new(OpenFdaSource::new(timeout, allow.clone())));
        registry.register(Box::new(CrossrefSource::new(timeout, allow.clone())));
        registry.register(Box::new(WikipediaSource::new(timeout, allow.clone())));
        registry.register(Box::new(FactcheckSource::new(timeout, allow)));
        registry
    }

    pub fn register(&mut self, adapter: Box<dyn EvidenceSource>) {
        let id = adapter.id();
        self.entries.insert(
            id,
            Registered {
                adapter,
                limiter: RateLimiter::new(1.0, 5),
            },
        );
    }

    pub fn contains(&self, id: SourceApi) -> bool {
        self.entries.contains_key(&id)
    }

    /// Fetch through the rate limiter and timeout. Always returns a list;
    /// failures are logged and yield empty.
    pub async fn fetch(&self, id: SourceApi, request: &FetchRequest) -> Vec<EvidenceCandidate> {
        let Some(entry) = self.entries.get(&id) else {
            debug!(source = id.as_str(), "No adapter registered, skipping");
            return Vec::new();
        };
        if !entry.limiter.try_acquire().await {
            warn!(source = id.as_str(), "Rate limit exhausted, returning empty");
            return Vec::new();
        }
        match tokio::time::timeout(self.timeout, entry.adapter.fetch(request)).await {
            Ok(candidates) => candidates,
            Err(_) => {
                warn!(source = id.as_str(), "Adapter fetch timed out");
                Vec::new()
            }
        }
    }
}

/// Normalize a raw API result into an [`EvidenceCandidate`], populating
/// entities, numbers, and keyphrases from title + snippet with the shared
/// detectors.
#[allow(clippy::too_many_arguments)]
pub fn normalize_candidate(
    source_api: SourceApi,
    evidence_type: EvidenceType,
    title: String,
    snippet: String,
    url: String,
    identifier: Option<String>,
    published_at: Option<NaiveDate>,
    allow: &HashSet<String>,
) -> EvidenceCandidate {
    let combined = format!("{} {}", title, snippet);
    let entity_list: Vec<String> = entities::detect(&combined, allow)
        .into_iter()
        .map(|e| e.text)
        .collect();
    let number_list = numbers::detect(&combined);
    let keyphrases = trigram_keyphrases(&combined, 12);

    EvidenceCandidate {
        source_api,
        evidence_type,
        title,
        snippet,
        url,
        identifier,
        published_at,
        entities: entity_list,
        numbers: number_list,
        keyphrases,
    }
}

/// Distinct normalized trigrams, in order of first appearance.
fn trigram_keyphrases(combined: &str, cap: usize) -> Vec<String> {
    let tokens = text::normalized_tokens(combined);
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for window in tokens.windows(3) {
        let phrase = window.join(" ");
        if seen.insert(phrase.clone()) {
            out.push(phrase);
            if out.len() >= cap {
                break;
            }
        }
    }
    out
}

/// Strip HTML tags and entities from an API snippet.
pub fn strip_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
