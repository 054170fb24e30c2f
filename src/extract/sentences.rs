//! Sentence splitting with abbreviation guard.
//!
//! Windows are split at `.`, `!`, `?`, `;` followed by whitespace and an
//! uppercase letter (or end of window). The terminating punctuation is kept.
//! Periods inside known abbreviations (`Dr.`, `Inc.`, `U.S.`) and between
//! two single capital letters never split.

use std::collections::HashSet;

/// A sentence with its char-offset span inside the window, used to
/// interpolate claim timestamps.
#[derive(Debug, Clone)]
pub struct Sentence {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

fn word_ending_at(text: &str, dot_end: usize) -> &str {
    let bytes = text.as_bytes();
    let mut start = dot_end;
    while start > 0 {
        let c = bytes[start - 1];
        if c.is_ascii_alphanumeric() || c == b'.' {
            start -= 1;
        } else {
            break;
        }
    }
    &text[start..dot_end]
}

fn is_single_capital_pair(text: &str, dot_idx: usize) -> bool {
    let bytes = text.as_bytes();
    if dot_idx == 0 {
        return false;
    }
    let prev = bytes[dot_idx - 1];
    if !prev.is_ascii_uppercase() {
        return false;
    }
    // Previous letter must be a lone capital ("U.S", not "...GDP.").
    if dot_idx >= 2 && bytes[dot_idx - 2].is_ascii_alphanumeric() {
        return false;
    }
    match bytes.get(dot_idx + 1) {
        Some(next) => next.is_ascii_uppercase(),
        None => false,
    }
}

/// Split a window into sentences.
pub fn split(window: &str, abbreviations: &HashSet<String>) -> Vec<Sentence> {
    let bytes = window.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if matches!(c, '.' | '!' | '?' | ';') {
            let split_here = if c == '.' {
                let word = word_ending_at(window, i + 1);
                !abbreviations.contains(word) && !is_single_capital_pair(window, i)
            } else {
                true
            };

            if split_here {
                // Followed by whitespace + uppercase, or end of window.
                let mut j = i + 1;
                while j < bytes.len() && (bytes[j] as char).is_whitespace() {
                    j += 1;
                }
                let boundary = if j == i + 1 {
                    j >= bytes.len() // punctuation at very end, no whitespace
                } else {
                    j >= bytes.len() || (bytes[j] as char).is_ascii_uppercase()
                };

                if boundary {
                    let text = window[start..=i].trim();
                    if !text.is_empty() {
                        sentences.push(Sentence {
                            text: text.to_string(),
                            start,
                            end: i + 1,
                        });
                    }
                    start = j;
                    i = j;
                    continue;
                }
            }
        }
        i += 1;
    }

    let tail = window[start.min(window.len())..].trim();
    if !tail.is_empty() {
        sentences.push(Sentence {
            text: tail.to_string(),
            start,
            end: window.len(),
        });
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abbrevs() -> HashSet<String> {
        ["Mr.", "Dr.", "Inc.", "U.S.", "e.g."]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_basic_split() {
        let parts = split("Rates went up. The market reacted quickly.", &abbrevs());
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].text, "Rates went up.");
        assert_eq!(parts[1].text, "The market reacted quickly.");
    }

    #[test]
    fn test_punctuation_preserved() {
        let parts = split("Did it work? It did! Nobody disputed it.", &abbrevs());
        assert_eq!(parts.len(), 3);
        assert!(parts[0].text.ends_with('?'));
        assert!(parts[1].text.ends_with('!'));
    }

    #[test]
    fn test_abbreviation_not_split() {
        let parts = split("Dr. Smith presented the findings. The panel agreed.", &abbrevs());
        assert_eq!(parts.len(), 2);
        assert!(parts[0].text.starts_with("Dr. Smith"));
    }

    #[test]
    fn test_us_abbreviation_not_split() {
        let parts = split("The U.S. Treasury issued new bonds. Yields fell.", &abbrevs());
        assert_eq!(parts.len(), 2);
        assert!(parts[0].text.contains("U.S. Treasury"));
    }

    #[test]
    fn test_no_split_before_lowercase() {
        // "approx. figures" style continuation: period followed by lowercase.
        let parts = split("It rose 2.8 percent. that said, nothing changed.", &abbrevs());
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn test_semicolon_splits() {
        let parts = split("Revenue doubled; Costs fell sharply.", &abbrevs());
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].text, "Revenue doubled;");
    }

    #[test]
    fn test_decimal_not_split() {
        let parts = split("Inflation hit 2.8 percent in March. Markets rallied.", &abbrevs());
        assert_eq!(parts.len(), 2);
        assert!(parts[0].text.contains("2.8 percent"));
    }

    #[test]
    fn test_offsets_cover_window() {
        let window = "First sentence here. Second sentence there.";
        let parts = split(window, &abbrevs());
        assert_eq!(parts[0].start, 0);
        assert!(parts[1].start > parts[0].end);
        assert_eq!(parts[1].end, window.len());
    }
}
