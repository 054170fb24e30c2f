//! Number detection with canonical values.
//!
//! Matches integers, decimals, percentages, currency-prefixed, comma-grouped,
//! and suffix-scaled forms (`96.5 billion`, `65k`). Each match carries its
//! canonical numeric value plus the original surface so exact-equality
//! scoring works across formatting differences.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::dates::DateMention;

/// Core pattern: optional currency symbol, digits (comma-grouped or plain,
/// optional decimals), optional scale word bound as a whole token.
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?P<cur>[$€£])?(?P<body>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)(?:\s*(?P<scale>(?i:trillion|billion|million|thousand|bn|[kmb]))\b)?",
    )
    .expect("number regex")
});

/// Unit token immediately following a number (`mg/dL`, `percent`, `bps`).
static UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<unit>%|[A-Za-zµ]+(?:/[A-Za-zµ]+)?)").expect("unit regex")
});

/// Recognized measurement units; anything else after a number is treated as
/// ordinary prose.
const KNOWN_UNITS: [&str; 14] = [
    "%", "percent", "percentage", "mg/dl", "mg", "g", "kg", "ml", "bps", "mph", "km", "gwh",
    "points", "basis",
];

/// A detected number with canonical value and surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberMention {
    /// Canonical value with scale applied (`$96.5 billion` → 96.5e9).
    pub value: f64,
    /// Original matched text, including currency/scale/unit.
    pub surface: String,
    /// Currency or measurement unit, if one was attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Scale word normalized to its canonical name (`bn` → `billion`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    pub start: usize,
    pub end: usize,
}

impl NumberMention {
    /// Exact canonical-numeric equality, tolerant of float formatting.
    pub fn value_eq(&self, other: &NumberMention) -> bool {
        values_equal(self.value, other.value)
    }

    /// Whether units or scales agree between two mentions. Requires both
    /// sides to carry the attribute; a bare number never "agrees".
    pub fn units_agree(&self, other: &NumberMention) -> bool {
        match (&self.unit, &other.unit) {
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => return true,
            _ => {}
        }
        matches!((&self.scale, &other.scale), (Some(a), Some(b)) if a == b)
    }

    /// Integer-style rendering for signal tags (96500000000, not 9.65e10).
    pub fn canonical_string(&self) -> String {
        if self.value.fract().abs() < f64::EPSILON && self.value.abs() < 9e15 {
            format!("{}", self.value as i64)
        } else {
            format!("{}", self.value)
        }
    }
}

/// Compare two canonical values with a relative epsilon.
pub fn values_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs());
    scale > 0.0 && (a - b).abs() / scale < 1e-9
}

fn normalize_scale(raw: &str) -> (&'static str, f64) {
    match raw.to_ascii_lowercase().as_str() {
        "k" | "thousand" => ("thousand", 1e3),
        "m" | "million" => ("million", 1e6),
        "b" | "bn" | "billion" => ("billion", 1e9),
        "trillion" => ("trillion", 1e12),
        _ => ("", 1.0),
    }
}

fn currency_name(symbol: &str) -> &'static str {
    match symbol {
        "$" => "USD",
        "€" => "EUR",
        "£" => "GBP",
        _ => "USD",
    }
}

/// Detect every number in `text`.
pub fn detect(text: &str) -> Vec<NumberMention> {
    let mut out = Vec::new();
    for caps in NUMBER_RE.captures_iter(text) {
        let whole = caps.get(0).expect("match");
        let body = &caps["body"];
        let Ok(base) = body.replace(',', "").parse::<f64>() else {
            continue;
        };

        let (scale_name, factor) = caps
            .name("scale")
            .map(|m| normalize_scale(m.as_str()))
            .unwrap_or(("", 1.0));

        let mut unit = caps.name("cur").map(|c| currency_name(c.as_str()).to_string());
        let mut end = whole.end();
        let mut surface_end = whole.end();

        // A unit token directly after the number (only when no scale word
        // already consumed the position).
        if unit.is_none() && caps.name("scale").is_none() {
            if let Some(ucaps) = UNIT_RE.captures(&text[whole.end()..]) {
                let candidate = &ucaps["unit"];
                if KNOWN_UNITS
                    .iter()
                    .any(|k| k.eq_ignore_ascii_case(candidate))
                {
                    let canonical = if candidate == "%" { "percent" } else { candidate };
                    unit = Some(canonical.to_string());
                    surface_end = whole.end() + ucaps.get(0).expect("unit").end();
                    end = surface_end;
                }
            }
        }

        out.push(NumberMention {
            value: base * factor,
            surface: text[whole.start()..surface_end].to_string(),
            unit,
            scale: (!scale_name.is_empty()).then(|| scale_name.to_string()),
            start: whole.start(),
            end,
        });
    }
    out
}

/// Detect numbers, dropping mentions that fall inside a detected date span
/// (years, quarter dates) so they do not double-count as numeric facts.
pub fn detect_significant(text: &str, dates: &[DateMention]) -> Vec<NumberMention> {
    detect(text)
        .into_iter()
        .filter(|n| !dates.iter().any(|d| n.start >= d.start && n.end <= d.end))
        .collect()
}
