//! Text ingestion: plain text and pre-timed transcripts.
//!
//! Text documents become pseudo-segments — ~200-char chunks cut at sentence
//! boundaries with synthetic timestamps at a nominal reading speed — so
//! non-audio inputs flow through the extraction pipeline unchanged. Timed
//! transcripts load from the `{"segments": [{start, end, text}]}` JSON
//! shape that speech-to-text collaborators produce.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::TimedSegment;

/// Target characters per pseudo-segment.
const SEGMENT_TARGET_CHARS: usize = 200;
/// Synthetic reading speed, characters per second.
const READING_CHARS_PER_SEC: f64 = 20.0;
/// Chunks shorter than this are noise, not content.
const MIN_CHUNK_CHARS: usize = 20;

#[derive(Debug, Deserialize)]
struct TranscriptFile {
    segments: Vec<TranscriptSegment>,
}

#[derive(Debug, Deserialize)]
struct TranscriptSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Load a transcript JSON file into timed segments.
pub fn load_transcript(path: &Path) -> Result<Vec<TimedSegment>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript: {}", path.display()))?;
    let parsed: TranscriptFile =
        serde_json::from_str(&content).context("Failed to parse transcript JSON")?;
    Ok(parsed
        .segments
        .into_iter()
        .map(|s| TimedSegment::new(s.text, s.start, s.end))
        .collect())
}

/// Convert plain text into pseudo-segments with synthetic uniform
/// timestamps. Timestamps are only meaningful for ordering.
pub fn text_to_segments(text: &str) -> Vec<TimedSegment> {
    let mut segments = Vec::new();
    let mut clock = 0.0f64;

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let chunks = if paragraph.len() <= SEGMENT_TARGET_CHARS {
            vec![paragraph.to_string()]
        } else {
            split_into_chunks(paragraph, SEGMENT_TARGET_CHARS)
        };

        for chunk in chunks {
            let trimmed = chunk.trim();
            if trimmed.len() < MIN_CHUNK_CHARS {
                continue;
            }
            let duration = (trimmed.len() as f64 / READING_CHARS_PER_SEC).max(1.0);
            segments.push(TimedSegment::new(
                trimmed,
                round3(clock),
                round3(clock + duration),
            ));
            clock += duration;
        }
    }

    segments
}

/// Split a paragraph at sentence endings into chunks of roughly
/// `target_chars`.
fn split_into_chunks(paragraph: &str, target_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentence_like(paragraph) {
        if !current.is_empty() && current.len() + sentence.len() > target_chars {
            chunks.push(current.trim().to_string());
            current = sentence.to_string();
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(sentence);
        }
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}

/// Rough sentence-ish split on terminal punctuation followed by whitespace.
fn split_sentence_like(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0usize;

    for i in 0..bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?')
            && bytes.get(i + 1).map(|b| b.is_ascii_whitespace()).unwrap_or(false)
        {
            parts.push(text[start..=i].trim());
            start = i + 1;
        }
    }
    if start < text.len() {
        let tail = text[start..].trim();
        if !tail.is_empty() {
            parts.push(tail);
        }
    }
    parts
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
