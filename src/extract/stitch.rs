//! Segment stitching.
//!
//! Transcript segments often end mid-sentence. Stitching merges adjacent
//! segments into windows so the sentence splitter sees complete sentences:
//! a window closes once it ends in sentence-terminal punctuation with at
//! least [`MIN_WINDOW_CHARS`] accumulated, or at the [`MAX_WINDOW_CHARS`]
//! cap regardless.

use crate::domain::TimedSegment;

/// Minimum characters before terminal punctuation may close a window.
pub const MIN_WINDOW_CHARS: usize = 80;

/// Hard cap on window size; a window is closed here even mid-sentence.
pub const MAX_WINDOW_CHARS: usize = 600;

/// A stitched text window spanning one or more segments.
#[derive(Debug, Clone)]
pub struct Window {
    pub text: String,
    pub start_s: f64,
    pub end_s: f64,
}

fn ends_sentence(text: &str) -> bool {
    matches!(
        text.trim_end().chars().last(),
        Some('.') | Some('!') | Some('?')
    )
}

/// Merge ordered segments into windows.
pub fn stitch(segments: &[TimedSegment]) -> Vec<Window> {
    let mut windows = Vec::new();
    let mut text = String::new();
    let mut start_s = 0.0;
    let mut end_s = 0.0;

    for segment in segments {
        let trimmed = segment.text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if text.is_empty() {
            start_s = segment.start_s;
        } else {
            text.push(' ');
        }
        text.push_str(trimmed);
        end_s = segment.end_s;

        let closes = (ends_sentence(&text) && text.len() >= MIN_WINDOW_CHARS)
            || text.len() >= MAX_WINDOW_CHARS;
        if closes {
            windows.push(Window {
                text: std::mem::take(&mut text),
                start_s,
                end_s,
            });
        }
    }

    if !text.is_empty() {
        windows.push(Window { text, start_s, end_s });
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, start: f64, end: f64) -> TimedSegment {
        TimedSegment::new(text, start, end)
    }

    #[test]
    fn test_stitch_merges_fragments() {
        let segments = vec![
            seg("The European Central Bank", 0.0, 5.0),
            seg(
                "announced it will maintain current interest rates at 4.5 percent through the first quarter.",
                5.0,
                10.0,
            ),
        ];
        let windows = stitch(&segments);
        assert_eq!(windows.len(), 1);
        assert!(windows[0].text.contains("European Central Bank announced"));
        assert_eq!(windows[0].start_s, 0.0);
        assert_eq!(windows[0].end_s, 10.0);
    }

    #[test]
    fn test_short_sentence_keeps_stitching() {
        // Ends with '.' but under the 80-char floor, so the window stays open.
        let segments = vec![
            seg("Rates went up.", 0.0, 2.0),
            seg("The Federal Reserve confirmed the quarter-point increase in its statement today.", 2.0, 8.0),
        ];
        let windows = stitch(&segments);
        assert_eq!(windows.len(), 1);
        assert!(windows[0].text.starts_with("Rates went up."));
    }

    #[test]
    fn test_cap_closes_window() {
        let long = "word ".repeat(80); // ~400 chars per segment
        let segments = vec![
            seg(&long, 0.0, 10.0),
            seg(&long, 10.0, 20.0),
            seg("short tail.", 20.0, 21.0),
        ];
        let windows = stitch(&segments);
        assert!(windows.len() >= 2);
        assert!(windows[0].text.len() >= MAX_WINDOW_CHARS);
    }

    #[test]
    fn test_trailing_partial_window_emitted() {
        let segments = vec![seg("an unfinished thought without punctuation", 0.0, 3.0)];
        let windows = stitch(&segments);
        assert_eq!(windows.len(), 1);
    }

    #[test]
    fn test_empty_segments_skipped() {
        let segments = vec![
            seg("   ", 0.0, 1.0),
            seg("Inflation dropped to 2.3 percent in March according to the bureau's report.", 1.0, 5.0),
        ];
        let windows = stitch(&segments);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_s, 1.0);
    }
}
