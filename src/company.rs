//! Company profile and claim extraction.
//!
//! A deterministic, regex-based pass over document text that runs once
//! per analysis. Its output labels the record and seeds the web query plan.

use crate::models::{Document, DocumentRole};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Characters of each document inspected for profile fields.
const PROFILE_SCAN_CHARS: usize = 5000;

/// Longest fragment kept as a claim.
const MAX_CLAIM_CHARS: usize = 120;

const MAX_CLAIMS: usize = 20;

/// Basic facts about the company under analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub stage: Option<String>,
}

impl CompanyProfile {
    /// Extract a profile from documents, pitch decks first.
    pub fn from_documents(documents: &[Document]) -> Self {
        let mut profile = CompanyProfile::default();

        for doc in ordered_for_profile(documents) {
            let text = head(&doc.extracted_text, PROFILE_SCAN_CHARS);

            if profile.name.is_none() {
                profile.name = find_name(text);
            }
            if profile.industry.is_none() {
                profile.industry = find_industry(text);
            }
            if profile.stage.is_none() {
                profile.stage = find_stage(text);
            }
        }

        profile
    }

    /// Name to label records with.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown Company")
    }
}

fn ordered_for_profile(documents: &[Document]) -> Vec<&Document> {
    let rank = |role: DocumentRole| match role {
        DocumentRole::PitchDeck => 0,
        DocumentRole::WebContent => 1,
        DocumentRole::DataRoom => 2,
        DocumentRole::General => 3,
        DocumentRole::Interaction => 4,
    };

    let mut docs: Vec<&Document> = documents.iter().filter(|d| d.is_usable()).collect();
    docs.sort_by_key(|d| rank(d.role));
    docs
}

fn head(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn labelled_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[\s#*>-]*(?i:company|startup)(?i: name)?\s*:\s*([A-Z0-9][A-Za-z0-9&.' ]*[A-Za-z0-9])")
            .expect("valid regex")
    })
}

fn leading_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[\s#*]*([A-Z][A-Za-z0-9&.']*(?: [A-Z0-9][A-Za-z0-9&.']*){0,3})\s*(?:[-–—:|]\s|,)")
            .expect("valid regex")
    })
}

fn find_name(text: &str) -> Option<String> {
    let captured = labelled_name_re()
        .captures(text)
        .or_else(|| leading_name_re().captures(text))?;
    let name = captured.get(1)?.as_str().trim().trim_end_matches('.');

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn find_industry(text: &str) -> Option<String> {
    const INDUSTRIES: [(&str, &[&str]); 5] = [
        ("fintech", &["financial services", "payments", "banking", "lending"]),
        ("healthtech", &["health", "medical", "clinical", "patient"]),
        ("saas", &["software", "platform", "cloud", "b2b"]),
        ("ai/ml", &["artificial intelligence", "machine learning"]),
        ("biotech", &["biotech", "pharmaceutical", "drug discovery"]),
    ];

    let lower = text.to_lowercase();
    INDUSTRIES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(industry, _)| industry.to_string())
}

fn stage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(pre-?seed|series\s+[a-c]|seed)\b").expect("valid regex")
    })
}

fn find_stage(text: &str) -> Option<String> {
    // Prefer the most specific mention anywhere in the text.
    let mentions: Vec<String> = stage_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect();

    if mentions.iter().any(|m| m.starts_with("pre")) {
        return Some("Pre-seed".to_string());
    }
    if let Some(series) = mentions.iter().find(|m| m.starts_with("series")) {
        let letter = series.chars().last()?.to_ascii_uppercase();
        return Some(format!("Series {}", letter));
    }
    if !mentions.is_empty() {
        return Some("Seed".to_string());
    }
    None
}

fn claim_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(\$\s?\d[\d,.]*\s?(?:[kmb]\b|million|billion|thousand)?|\d+(?:\.\d+)?\s?%|\d[\d,.]*\s?[km]?\+?\s+(?:users|customers|clients|subscribers|downloads|members))",
        )
        .expect("valid regex")
    })
}

fn fragment_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[;\n]|[,.!?]\s").expect("valid regex"))
}

/// Extract quantitative claims (money, percentages, user counts).
///
/// Fragments keep document order and are deduplicated case-insensitively.
pub fn extract_claims(documents: &[Document]) -> Vec<String> {
    let mut claims: Vec<String> = Vec::new();

    for doc in ordered_for_profile(documents) {
        for fragment in fragment_split_re().split(&doc.extracted_text) {
            let fragment = fragment
                .trim()
                .trim_start_matches(['-', '*', '#', '>', '•'])
                .trim()
                .trim_end_matches('.');

            if fragment.is_empty()
                || fragment.chars().count() > MAX_CLAIM_CHARS
                || !claim_re().is_match(fragment)
            {
                continue;
            }

            if !claims.iter().any(|c| c.eq_ignore_ascii_case(fragment)) {
                claims.push(fragment.to_string());
            }
            if claims.len() >= MAX_CLAIMS {
                return claims;
            }
        }
    }

    claims
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_pitch_line() {
        let docs = vec![Document::from_text(
            "pitch.md",
            "Company X, $2M ARR, 40% MoM growth",
        )];
        let profile = CompanyProfile::from_documents(&docs);
        assert_eq!(profile.name.as_deref(), Some("Company X"));
        assert_eq!(profile.industry, None);
        assert_eq!(profile.stage, None);
    }

    #[test]
    fn test_profile_labelled_fields() {
        let docs = vec![
            Document::from_text("notes.md", "Zeta - unrelated notes"),
            Document::from_text(
                "deck.md",
                "# Overview\nCompany: Acme Robotics\nA B2B software platform raising a Series B.\nWe closed our seed in 2022.",
            ),
        ];
        let profile = CompanyProfile::from_documents(&docs);
        assert_eq!(profile.name.as_deref(), Some("Acme Robotics"));
        assert_eq!(profile.industry.as_deref(), Some("saas"));
        assert_eq!(profile.stage.as_deref(), Some("Series B"));
    }

    #[test]
    fn test_profile_unknown() {
        let profile = CompanyProfile::from_documents(&[Document::from_text("a.txt", "lowercase only")]);
        assert_eq!(profile.display_name(), "Unknown Company");
    }

    #[test]
    fn test_extract_claims() {
        let docs = vec![Document::from_text(
            "pitch.md",
            "Company X, $2M ARR, 40% MoM growth. We have 12,000 users; team of five.\n- $2M ARR",
        )];
        let claims = extract_claims(&docs);
        assert_eq!(claims, vec!["$2M ARR", "40% MoM growth", "We have 12,000 users"]);
    }
}
