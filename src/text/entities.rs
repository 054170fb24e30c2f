//! Rule-based proper-noun detection.
//!
//! No ML: entities are runs of capitalized tokens away from the sentence
//! start, plus organization suffixes and a known-entity allow-list supplied
//! by the caller (the allow-list catches names like "Alphabet" even when
//! they open the sentence).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{tokenize, Token};

/// Suffix tokens that mark an organization name.
const ORG_SUFFIXES: [&str; 16] = [
    "Inc", "Corp", "Corporation", "Ltd", "LLC", "Co", "Company", "Group", "Holdings", "Bank",
    "University", "Institute", "Agency", "Administration", "Department", "Commission",
];

/// Sentence openers that never start an entity run.
const RUN_BLOCKERS: [&str; 8] = ["The", "A", "An", "This", "That", "These", "Those", "It"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Org,
    Proper,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Org => "ORG",
            EntityKind::Proper => "PROPER",
        }
    }
}

/// A detected entity with byte offsets into the sentence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMention {
    pub text: String,
    pub kind: EntityKind,
    pub start: usize,
    pub end: usize,
}

fn is_capitalized(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_uppercase() => {}
        _ => return false,
    }
    if token.chars().count() < 2 {
        // Single capitals ("I", "A") don't count.
        return false;
    }
    // "Goldman" or an acronym like "FDA"; mixed letter-digit tokens ("Q4") don't count.
    let rest_lower = chars.clone().all(|c| c.is_lowercase());
    let all_upper = token.chars().all(|c| c.is_uppercase());
    rest_lower || all_upper
}

fn is_org_suffix(token: &str) -> bool {
    let trimmed = token.trim_end_matches('.');
    ORG_SUFFIXES.contains(&trimmed)
}

/// Detect entities in a sentence.
///
/// `allow` is the lowercased known-entity list from the config; matches
/// against it are tagged ORG wherever they appear, including sentence start.
pub fn detect(text: &str, allow: &HashSet<String>) -> Vec<EntityMention> {
    let tokens = tokenize(text);
    let mut out: Vec<EntityMention> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let tok = &tokens[i];
        let starts_run = is_capitalized(tok.text) && !RUN_BLOCKERS.contains(&tok.text);
        if !starts_run {
            i += 1;
            continue;
        }

        // Extend the run over further capitalized tokens and org suffixes.
        let mut j = i + 1;
        while j < tokens.len() && (is_capitalized(tokens[j].text) || is_org_suffix(tokens[j].text))
        {
            j += 1;
        }

        let run_text = &text[tok.start..tokens[j - 1].end];
        let run_lower = run_text.to_lowercase();
        let allow_listed = allow.contains(&run_lower)
            || tokens[i..j]
                .iter()
                .any(|t| allow.contains(&t.text.to_lowercase()));
        let has_suffix = tokens[i..j].iter().any(|t| is_org_suffix(t.text));

        // A single capitalized word at sentence start is ambiguous (every
        // sentence capitalizes its first word) and only counts when
        // allow-listed. All-caps acronyms (GDP, LDL, NASA) are unambiguous
        // and count anywhere, as do multi-token runs.
        let at_start = i == 0;
        let is_acronym = tok.text.len() >= 2
            && tok.text.len() <= 5
            && tok.text.chars().all(|c| c.is_ascii_uppercase());
        let accept = !at_start || j - i >= 2 || allow_listed || is_acronym;

        if accept {
            let kind = if has_suffix || allow_listed {
                EntityKind::Org
            } else {
                EntityKind::Proper
            };
            out.push(EntityMention {
                text: run_text.to_string(),
                kind,
                start: tok.start,
                end: tokens[j - 1].end,
            });
        }
        i = j;
    }

    dedup_keep_first(out)
}

fn dedup_keep_first(mentions: Vec<EntityMention>) -> Vec<EntityMention> {
    let mut seen: HashSet<String> = HashSet::new();
    mentions
        .into_iter()
        .filter(|m| seen.insert(m.text.to_lowercase()))
        .collect()
}

/// Offset of the first proper-noun token, used for the subject-anchor rule.
pub fn first_entity_offset(text: &str, allow: &HashSet<String>) -> Option<usize> {
    detect(text, allow).first().map(|m| m.start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow() -> HashSet<String> {
        ["alphabet", "goldman sachs", "federal reserve", "nvidia"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_midsentence_run() {
        let found = detect("the report from Goldman Sachs was clear", &allow());
        assert_eq!(found[0].text, "Goldman Sachs");
        assert_eq!(found[0].kind, EntityKind::Org);
    }

    #[test]
    fn test_allowlisted_at_sentence_start() {
        let found = detect("Alphabet reported revenue of $96.5 billion.", &allow());
        assert_eq!(found[0].text, "Alphabet");
        assert_eq!(found[0].kind, EntityKind::Org);
    }

    #[test]
    fn test_unknown_single_cap_at_start_ignored() {
        let found = detect("Nobody reported anything useful today", &allow());
        assert!(found.is_empty());
    }

    #[test]
    fn test_acronym_at_start_accepted() {
        let found = detect("LDL cholesterol levels above 160 are risky", &allow());
        assert_eq!(found[0].text, "LDL");
        assert_eq!(found[0].kind, EntityKind::Proper);

        let found = detect("GDP grew 2.8% in 2024", &allow());
        assert_eq!(found[0].text, "GDP");
    }

    #[test]
    fn test_org_suffix() {
        let found = detect("shares of Acme Corp fell sharply", &allow());
        assert_eq!(found[0].text, "Acme Corp");
        assert_eq!(found[0].kind, EntityKind::Org);
    }

    #[test]
    fn test_the_does_not_start_run() {
        let found = detect("The Federal Reserve raised rates", &allow());
        assert_eq!(found[0].text, "Federal Reserve");
        assert_eq!(found[0].kind, EntityKind::Org);
    }

    #[test]
    fn test_person_name_is_proper() {
        let found = detect("economists cited John Smith on the matter", &allow());
        assert_eq!(found[0].text, "John Smith");
        assert_eq!(found[0].kind, EntityKind::Proper);
    }

    #[test]
    fn test_duplicates_collapsed() {
        let found = detect("Nvidia said Nvidia chips sold out", &allow());
        assert_eq!(found.len(), 1);
    }
}
