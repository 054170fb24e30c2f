//! Command-line interface.
//!
//! Provides commands for ingesting sources, extracting claims, running
//! assisted verification, recording human review verdicts, and inspecting
//! the cross-source aggregate.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};

use crate::adapters::AdapterRegistry;
use crate::config::Config;
use crate::core::{ClaimStore, JsonlStore, Orchestrator};
use crate::domain::{
    new_id, ClaimStatus, EvidenceCandidate, EvidenceType, ScoredEvidence, Source, SourceApi,
    SourceKind,
};
use crate::ingest;

/// veritas - deterministic claim extraction and fact verification
#[derive(Parser, Debug)]
#[command(name = "veritas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional YAML config overriding the built-in lexicons
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a text file or a timed transcript as a new source
    Ingest {
        /// Path to a .txt file or a transcript .json
        file: PathBuf,

        /// Title for the source (defaults to the file stem)
        #[arg(short, long)]
        title: Option<String>,

        /// Treat the file as a transcript JSON with timed segments
        #[arg(long)]
        transcript: bool,
    },

    /// Extract claims from an ingested source
    Extract {
        /// Source ID
        source_id: String,

        /// Write a claims.json export next to the store
        #[arg(long)]
        export: bool,
    },

    /// Discover, score, and persist evidence for a source's claims
    Assist {
        /// Source ID
        source_id: String,

        /// Per-source deadline in seconds
        #[arg(long)]
        deadline_secs: Option<u64>,
    },

    /// Manually set a claim's status and optionally attach evidence.
    ///
    /// This is the human-review path: unlike auto-scoring it may downgrade
    /// a verdict, and it is the only way a claim reaches CONTRADICTED.
    Verify {
        /// Source ID
        source_id: String,

        /// Claim ID
        claim_id: String,

        /// Verdict to record
        #[arg(long, value_enum)]
        status: VerdictArg,

        /// Evidence URL to attach (repeatable)
        #[arg(long = "evidence-url")]
        evidence_urls: Vec<String>,

        /// Evidence type for attached URLs
        #[arg(long, value_enum, default_value = "secondary")]
        evidence_type: EvidenceTypeArg,

        /// Reviewer notes stored with the attached evidence
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Rebuild the cross-source aggregate (groups + contradiction flags)
    Aggregate {
        /// Maximum groups to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show claims and verification state for a source
    Report {
        /// Source ID
        source_id: String,
    },

    /// List ingested sources
    Sources,

    /// Show the resolved configuration
    Config,
}

/// Status values a reviewer may record.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VerdictArg {
    Supported,
    Contradicted,
    Partial,
    Unknown,
}

impl From<VerdictArg> for ClaimStatus {
    fn from(arg: VerdictArg) -> Self {
        match arg {
            VerdictArg::Supported => ClaimStatus::Supported,
            VerdictArg::Contradicted => ClaimStatus::Contradicted,
            VerdictArg::Partial => ClaimStatus::Partial,
            VerdictArg::Unknown => ClaimStatus::Unknown,
        }
    }
}

/// Evidence types accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EvidenceTypeArg {
    Filing,
    Dataset,
    Paper,
    Gov,
    Secondary,
    Factcheck,
}

impl From<EvidenceTypeArg> for EvidenceType {
    fn from(arg: EvidenceTypeArg) -> Self {
        match arg {
            EvidenceTypeArg::Filing => EvidenceType::Filing,
            EvidenceTypeArg::Dataset => EvidenceType::Dataset,
            EvidenceTypeArg::Paper => EvidenceType::Paper,
            EvidenceTypeArg::Gov => EvidenceType::Gov,
            EvidenceTypeArg::Secondary => EvidenceType::Secondary,
            EvidenceTypeArg::Factcheck => EvidenceType::Factcheck,
        }
    }
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = Arc::new(Config::load(self.config.as_deref())?);
        let store = Arc::new(JsonlStore::open_default()?);

        match self.command {
            Commands::Ingest {
                file,
                title,
                transcript,
            } => ingest_command(&*store, file, title, transcript).await,
            Commands::Extract { source_id, export } => {
                let registry = Arc::new(AdapterRegistry::with_defaults(&config));
                let orchestrator = Orchestrator::new(config, store.clone(), registry);
                let claims = orchestrator.extract(&source_id).await?;
                println!("Extracted {} claims from {}", claims.len(), source_id);
                for claim in &claims {
                    println!(
                        "  [{}] ({}) {}",
                        &claim.id,
                        claim.category.as_str(),
                        claim.text
                    );
                }
                if export {
                    let path = export_claims(&source_id, &claims)?;
                    println!("Wrote {}", path.display());
                }
                Ok(())
            }
            Commands::Assist {
                source_id,
                deadline_secs,
            } => {
                let registry = Arc::new(AdapterRegistry::with_defaults(&config));
                let mut orchestrator = Orchestrator::new(config, store, registry);
                if let Some(secs) = deadline_secs {
                    orchestrator = orchestrator.with_deadline(Duration::from_secs(secs));
                }
                let report = orchestrator.assist(&source_id).await?;
                println!("Assist report for {}", report.source_id);
                println!("  extracted: {}", report.extracted);
                println!("  evidenced: {}", report.evidenced);
                println!("  supported: {}", report.supported);
                println!("  partial:   {}", report.partial);
                println!("  unknown:   {}", report.unknown);
                println!("  errored:   {}", report.errored);
                if report.deadline_hit {
                    println!("  (deadline hit; remaining claims left unknown)");
                }
                Ok(())
            }
            Commands::Verify {
                source_id,
                claim_id,
                status,
                evidence_urls,
                evidence_type,
                notes,
            } => {
                verify_command(
                    &*store,
                    &source_id,
                    &claim_id,
                    status.into(),
                    &evidence_urls,
                    evidence_type.into(),
                    &notes,
                )
                .await
            }
            Commands::Aggregate { limit } => {
                let registry = Arc::new(AdapterRegistry::with_defaults(&config));
                let orchestrator = Orchestrator::new(config, store, registry);
                let result = orchestrator.aggregate().await?;
                println!("{} groups", result.groups.len());
                for group in result.groups.iter().take(limit) {
                    println!(
                        "  [{}] {} sources, {} claims, first seen {}",
                        group.id,
                        group.source_count,
                        group.claim_count,
                        group.first_seen.format("%Y-%m-%d")
                    );
                    println!("      {}", group.representative_text);
                }
                if !result.contradictions.is_empty() {
                    println!("{} contradiction flags", result.contradictions.len());
                    for flag in &result.contradictions {
                        println!(
                            "  {} vs {} (entities: {}; numbers {} vs {})",
                            flag.group_a,
                            flag.group_b,
                            flag.shared_entities.join(", "),
                            flag.number_a,
                            flag.number_b
                        );
                    }
                }
                Ok(())
            }
            Commands::Report { source_id } => report_command(&*store, &source_id).await,
            Commands::Sources => {
                for source in store.list_sources().await? {
                    println!(
                        "{}  {}  {}  {}",
                        source.id,
                        source.ingested_at.format("%Y-%m-%d %H:%M"),
                        kind_str(source.kind),
                        source.title
                    );
                }
                Ok(())
            }
            Commands::Config => {
                println!("{}", serde_yaml::to_string(&*config)?);
                Ok(())
            }
        }
    }
}

fn kind_str(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Audio => "audio",
        SourceKind::Video => "video",
        SourceKind::Text => "text",
        SourceKind::Pdf => "pdf",
        SourceKind::Web => "web",
    }
}

async fn ingest_command(
    store: &dyn ClaimStore,
    file: PathBuf,
    title: Option<String>,
    transcript: bool,
) -> Result<()> {
    let segments = if transcript {
        ingest::load_transcript(&file)?
    } else {
        let text = std::fs::read_to_string(&file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        anyhow::ensure!(!text.trim().is_empty(), "File is empty: {}", file.display());
        ingest::text_to_segments(&text)
    };
    anyhow::ensure!(!segments.is_empty(), "No segments could be created");

    let source = Source {
        id: new_id(),
        kind: if transcript {
            SourceKind::Audio
        } else {
            SourceKind::Text
        },
        title: title.unwrap_or_else(|| {
            file.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "untitled".to_string())
        }),
        origin_url: Some(file.display().to_string()),
        ingested_at: Utc::now(),
    };

    store.put_source(&source).await?;
    store.put_segments(&source.id, &segments).await?;
    println!("Ingested {} ({} segments) as {}", source.title, segments.len(), source.id);
    Ok(())
}

/// Record a reviewer's verdict for one claim, attaching any evidence links.
async fn verify_command(
    store: &dyn ClaimStore,
    source_id: &str,
    claim_id: &str,
    status: ClaimStatus,
    evidence_urls: &[String],
    evidence_type: EvidenceType,
    notes: &str,
) -> Result<()> {
    let claims = store.claims_for_source(source_id).await?;
    let claim = claims
        .iter()
        .find(|c| c.id == claim_id)
        .with_context(|| format!("Claim '{}' not found in source '{}'", claim_id, source_id))?;

    let evidence: Vec<ScoredEvidence> = evidence_urls
        .iter()
        .map(|url| ScoredEvidence {
            claim_id: claim.id.clone(),
            candidate: EvidenceCandidate {
                source_api: SourceApi::Manual,
                evidence_type,
                title: format!("Reviewer evidence for claim {}", claim.id),
                snippet: notes.to_string(),
                url: url.clone(),
                identifier: None,
                published_at: None,
                entities: Vec::new(),
                numbers: Vec::new(),
                keyphrases: Vec::new(),
            },
            score: 0,
            breakdown: Default::default(),
            matched_keyphrase: None,
            matched_number: None,
        })
        .collect();

    store
        .override_status(source_id, &claim.id, status, &evidence)
        .await?;
    println!(
        "Set claim {} to {:?} ({} evidence link(s) attached)",
        claim.id,
        status,
        evidence.len()
    );
    Ok(())
}

async fn report_command(store: &dyn ClaimStore, source_id: &str) -> Result<()> {
    let claims = store.claims_for_source(source_id).await?;
    let verifications = store.verifications_for_source(source_id).await?;

    println!("{} claims for {}", claims.len(), source_id);
    for claim in &claims {
        let verification = verifications.iter().find(|v| v.claim_id == claim.id);
        let (status, evidence_count, human) = match verification {
            Some(v) => (v.status, v.evidence.len(), v.human),
            None => (claim.status, 0, false),
        };
        println!(
            "  [{:?}]{} ({}) {} evidence — {}",
            status,
            if human { " [human]" } else { "" },
            claim.category.as_str(),
            evidence_count,
            claim.text
        );
        if let Some(v) = verification {
            for item in v.evidence.iter().take(3) {
                println!(
                    "      {:3}  {}  {}",
                    item.score,
                    item.candidate.source_api.as_str(),
                    item.candidate.title
                );
            }
        }
    }
    Ok(())
}

/// Write the claims.json export with truncated display hashes.
fn export_claims(source_id: &str, claims: &[crate::domain::Claim]) -> Result<PathBuf> {
    let dir = Config::home_dir()?.join("sources").join(source_id);
    let payload: Vec<serde_json::Value> = claims
        .iter()
        .map(|c| {
            serde_json::json!({
                "id": c.id,
                "text": c.text,
                "start_s": c.start_s,
                "end_s": c.end_s,
                "confidence_language": c.confidence_language,
                "category": c.category,
                "content_hash": &c.content_hash[..16],
                "global_hash": &c.global_hash[..16],
                "signals": c.signal_log.join("|"),
                "status": c.status,
            })
        })
        .collect();
    let path = dir.join("claims.json");
    std::fs::write(&path, serde_json::to_string_pretty(&payload)?)?;
    Ok(path)
}
