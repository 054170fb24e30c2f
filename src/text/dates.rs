//! Date detection.
//!
//! Matches ISO dates, `Month DD[, YYYY]`, bare years in [1500, 2100],
//! fiscal quarters (`Q4 2024`), and relative forms (`last quarter`) as
//! unresolved markers. Relative forms are resolved later against an
//! explicit reference time, never the wall clock.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static ISO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("iso date regex"));

static MONTH_DAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2})(?:st|nd|rd|th)?(?:,\s*(\d{4}))?\b",
    )
    .expect("month-day regex")
});

static QUARTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:Q([1-4])\s*(\d{4})|(first|second|third|fourth)\s+quarter(?:\s+of)?\s+(\d{4}))\b")
        .expect("quarter regex")
});

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(last|next|this)\s+(year|quarter|month|week)\b").expect("relative regex")
});

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("year regex"));

/// Shape of a detected date expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateKind {
    Iso,
    MonthDay,
    Quarter,
    Year,
    Relative,
}

/// A detected date with its surface and, where possible, a resolved day.
///
/// Years resolve to mid-year and quarters to mid-quarter so temporal
/// distance comparisons stay meaningful; relative forms stay unresolved
/// until a reference time is supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateMention {
    pub surface: String,
    pub kind: DateKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<NaiveDate>,
    pub start: usize,
    pub end: usize,
}

fn month_number(name: &str) -> u32 {
    match name.to_ascii_lowercase().as_str() {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => 1,
    }
}

fn mid_quarter(q: u32, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, q * 3 - 1, 15)
}

fn overlaps(existing: &[DateMention], start: usize, end: usize) -> bool {
    existing.iter().any(|d| start < d.end && end > d.start)
}

/// Detect every date expression in `text`.
///
/// Patterns are applied in specificity order (ISO, month-day, quarter,
/// relative, bare year); later patterns skip spans already claimed, so the
/// year inside `Q4 2024` is not reported twice.
pub fn detect(text: &str) -> Vec<DateMention> {
    let mut found: Vec<DateMention> = Vec::new();

    for caps in ISO_RE.captures_iter(text) {
        let m = caps.get(0).expect("match");
        let (y, mo, d) = (
            caps[1].parse::<i32>().unwrap_or(0),
            caps[2].parse::<u32>().unwrap_or(0),
            caps[3].parse::<u32>().unwrap_or(0),
        );
        let Some(date) = NaiveDate::from_ymd_opt(y, mo, d) else {
            continue;
        };
        found.push(DateMention {
            surface: m.as_str().to_string(),
            kind: DateKind::Iso,
            resolved: Some(date),
            start: m.start(),
            end: m.end(),
        });
    }

    for caps in MONTH_DAY_RE.captures_iter(text) {
        let m = caps.get(0).expect("match");
        if overlaps(&found, m.start(), m.end()) {
            continue;
        }
        let month = month_number(&caps[1]);
        let day = caps[2].parse::<u32>().unwrap_or(1);
        let resolved = caps
            .get(3)
            .and_then(|y| y.as_str().parse::<i32>().ok())
            .and_then(|y| NaiveDate::from_ymd_opt(y, month, day));
        found.push(DateMention {
            surface: m.as_str().to_string(),
            kind: DateKind::MonthDay,
            resolved,
            start: m.start(),
            end: m.end(),
        });
    }

    for caps in QUARTER_RE.captures_iter(text) {
        let m = caps.get(0).expect("match");
        if overlaps(&found, m.start(), m.end()) {
            continue;
        }
        let (q, year) = if let (Some(q), Some(y)) = (caps.get(1), caps.get(2)) {
            (
                q.as_str().parse::<u32>().unwrap_or(1),
                y.as_str().parse::<i32>().unwrap_or(0),
            )
        } else {
            let q = match caps[3].to_ascii_lowercase().as_str() {
                "first" => 1,
                "second" => 2,
                "third" => 3,
                _ => 4,
            };
            (q, caps[4].parse::<i32>().unwrap_or(0))
        };
        found.push(DateMention {
            surface: m.as_str().to_string(),
            kind: DateKind::Quarter,
            resolved: mid_quarter(q, year),
            start: m.start(),
            end: m.end(),
        });
    }

    for caps in RELATIVE_RE.captures_iter(text) {
        let m = caps.get(0).expect("match");
        if overlaps(&found, m.start(), m.end()) {
            continue;
        }
        found.push(DateMention {
            surface: m.as_str().to_string(),
            kind: DateKind::Relative,
            resolved: None,
            start: m.start(),
            end: m.end(),
        });
    }

    for caps in YEAR_RE.captures_iter(text) {
        let m = caps.get(0).expect("match");
        if overlaps(&found, m.start(), m.end()) {
            continue;
        }
        let year: i32 = match caps[1].parse() {
            Ok(y) if (1500..=2100).contains(&y) => y,
            _ => continue,
        };
        found.push(DateMention {
            surface: m.as_str().to_string(),
            kind: DateKind::Year,
            resolved: NaiveDate::from_ymd_opt(year, 6, 30),
            start: m.start(),
            end: m.end(),
        });
    }

    found.sort_by_key(|d| d.start);
    found
}

impl DateMention {
    /// Resolve a relative date against an explicit reference day.
    pub fn resolve_relative(&self, reference: NaiveDate) -> Option<NaiveDate> {
        if self.kind != DateKind::Relative {
            return self.resolved;
        }
        let lower = self.surface.to_ascii_lowercase();
        let shift_days: i64 = if lower.contains("year") {
            365
        } else if lower.contains("quarter") {
            91
        } else if lower.contains("month") {
            30
        } else {
            7
        };
        if lower.starts_with("last") {
            reference.checked_sub_signed(chrono::Duration::days(shift_days))
        } else if lower.starts_with("next") {
            reference.checked_add_signed(chrono::Duration::days(shift_days))
        } else {
            Some(reference)
        }
    }

    /// Calendar year carried by this mention, if any.
    pub fn year(&self) -> Option<i32> {
        self.resolved.map(|d| d.year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_date() {
        let dates = detect("filed on 2024-01-15 with the commission");
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].kind, DateKind::Iso);
        assert_eq!(dates[0].resolved, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_month_day_with_year() {
        let dates = detect("the policy changed on January 15, 2024 after the vote");
        assert_eq!(dates[0].kind, DateKind::MonthDay);
        assert_eq!(dates[0].resolved, NaiveDate::from_ymd_opt(2024, 1, 15));
    }

    #[test]
    fn test_month_day_without_year_unresolved() {
        let dates = detect("the policy changed on January 15 after the meeting");
        assert_eq!(dates[0].kind, DateKind::MonthDay);
        assert!(dates[0].resolved.is_none());
    }

    #[test]
    fn test_quarter() {
        let dates = detect("revenue of $96.5 billion in Q4 2024.");
        let q = dates.iter().find(|d| d.kind == DateKind::Quarter).unwrap();
        assert_eq!(q.surface, "Q4 2024");
        assert_eq!(q.resolved, NaiveDate::from_ymd_opt(2024, 11, 15));
    }

    #[test]
    fn test_quarter_spelled_out() {
        let dates = detect("in the fourth quarter of 2024 margins improved");
        assert_eq!(dates[0].kind, DateKind::Quarter);
        assert_eq!(dates[0].year(), Some(2024));
    }

    #[test]
    fn test_bare_year_in_range() {
        let dates = detect("GDP grew 2.8% in 2024.");
        let y = dates.iter().find(|d| d.kind == DateKind::Year).unwrap();
        assert_eq!(y.year(), Some(2024));
    }

    #[test]
    fn test_bare_year_out_of_range() {
        assert!(detect("serial number 3022 was flagged").is_empty());
        assert!(detect("in the year 1200 nothing happened").is_empty());
    }

    #[test]
    fn test_relative_marker() {
        let dates = detect("sales doubled since last quarter");
        assert_eq!(dates[0].kind, DateKind::Relative);
        assert!(dates[0].resolved.is_none());

        let reference = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let resolved = dates[0].resolve_relative(reference).unwrap();
        assert!(resolved < reference);
    }

    #[test]
    fn test_quarter_year_not_double_counted() {
        let dates = detect("in Q4 2024 revenue rose");
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].kind, DateKind::Quarter);
    }
}
