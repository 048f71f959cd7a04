use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::matching::{similarity_percent, string_similarity};
use crate::models::NameMatchDetails;

lazy_static! {
    // The holder-name field label on Malta firearms licenses, in either
    // language.
    static ref NAME_LABEL: Regex = Regex::new(r"(?i)isem\s+u\s+kunjom|name\s+and\s+surname").unwrap();

    // Relationship terms that follow the holder's name ("JOHN BORG bin
    // PAUL"). Everything from the term onward is the parent's name.
    static ref RELATIONSHIP_TERM: Regex = Regex::new(r"(?i)\b(bin|bint|son|daughter)\b").unwrap();

    // A line that is nothing but a relationship term, sometimes with the
    // word "of" OCR'd alongside it.
    static ref BARE_RELATIONSHIP_LINE: Regex =
        Regex::new(r"(?i)^\s*(bin|bint|son|daughter)(\s+of)?\s*$").unwrap();

    // Address and document-label words that disqualify a candidate line.
    static ref NOISE_WORDS: Regex = Regex::new(
        r"(?i)address|indirizz|identity|card|number|numru|licen[cs]e|licen[cs]ja|triq|street|road|malta|police|firearms|valid"
    )
    .unwrap();
}

/// A token from the document must reach this similarity against a profile
/// name part to count as a match.
const TOKEN_SIMILARITY_THRESHOLD: f64 = 0.75;

/// Lines scanned above the label for the holder name.
const LINES_BEFORE_LABEL: usize = 2;

/// Lines scanned below the label for the holder name.
const LINES_AFTER_LABEL: usize = 3;

/// Outcome of comparing a document's holder name against the profile name.
#[derive(Debug, Clone)]
pub struct NameVerification {
    pub name_match: bool,
    pub extracted_name: Option<String>,
    pub details: Option<NameMatchDetails>,
}

/// Extracts the holder name from license OCR text and compares it to the
/// profile name with per-token fuzzy matching.
pub struct LicenseNameMatcher;

impl LicenseNameMatcher {
    /// Verifies the holder name on a license. With no profile name supplied
    /// there is nothing to compare against, so the match passes.
    pub fn verify(text: &str, first_name: Option<&str>, last_name: Option<&str>) -> NameVerification {
        let first = first_name.unwrap_or("").trim();
        let last = last_name.unwrap_or("").trim();

        if first.is_empty() && last.is_empty() {
            return NameVerification {
                name_match: true,
                extracted_name: None,
                details: None,
            };
        }

        let extracted = match Self::extract(text) {
            Some(name) => name,
            None => {
                debug!("no holder name found on license");
                return NameVerification {
                    name_match: false,
                    extracted_name: None,
                    details: None,
                };
            }
        };

        let normalized = normalize_name(&extracted);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        let first_upper = first.to_uppercase();
        let last_upper = last.to_uppercase();

        let first_found = first.is_empty()
            || tokens
                .iter()
                .any(|t| string_similarity(t, &first_upper) >= TOKEN_SIMILARITY_THRESHOLD);
        let last_found = last.is_empty()
            || tokens
                .iter()
                .any(|t| string_similarity(t, &last_upper) >= TOKEN_SIMILARITY_THRESHOLD);

        let profile_name = format!("{} {}", first_upper, last_upper)
            .trim()
            .to_string();
        let details = NameMatchDetails {
            extracted_name: normalized.clone(),
            profile_name: profile_name.clone(),
            similarity_score: similarity_percent(&normalized, &profile_name),
        };

        NameVerification {
            name_match: first_found && last_found,
            extracted_name: Some(normalized),
            details: Some(details),
        }
    }

    /// Finds the holder name relative to the name field label. Tries the
    /// remainder of the label line, then lines above, then lines below.
    pub fn extract(text: &str) -> Option<String> {
        let lines: Vec<&str> = text.lines().collect();
        let label_idx = lines.iter().position(|l| NAME_LABEL.is_match(l))?;
        let label_line = lines[label_idx];

        // (a) Remainder of the label line, cut at any relationship term.
        if let Some(m) = NAME_LABEL.find(label_line) {
            let remainder = label_line[m.end()..]
                .trim_start_matches(|c: char| c == ':' || c == '.' || c == '-' || c.is_whitespace());
            let candidate = match RELATIONSHIP_TERM.find(remainder) {
                Some(rel) => &remainder[..rel.start()],
                None => remainder,
            };
            if let Some(name) = validate_candidate(candidate) {
                return Some(name);
            }
        }

        // (b) Lines above: the name is sometimes printed before its label.
        for offset in 1..=LINES_BEFORE_LABEL {
            if offset > label_idx {
                break;
            }
            if let Some(name) = validate_candidate(lines[label_idx - offset]) {
                return Some(name);
            }
        }

        // (c) Lines below, skipping lines that are only a relationship term.
        for line in lines.iter().skip(label_idx + 1).take(LINES_AFTER_LABEL) {
            if BARE_RELATIONSHIP_LINE.is_match(line) {
                continue;
            }
            let candidate = match RELATIONSHIP_TERM.find(line) {
                Some(rel) => &line[..rel.start()],
                None => line,
            };
            if let Some(name) = validate_candidate(candidate) {
                return Some(name);
            }
        }

        None
    }
}

/// A candidate is plausible as a person's name: long enough, at least two
/// tokens, letters and spaces only, and free of address/label noise.
fn validate_candidate(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.len() < 5 {
        return None;
    }
    if !trimmed.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return None;
    }
    if trimmed.split_whitespace().count() < 2 {
        return None;
    }
    if NOISE_WORDS.is_match(trimmed) {
        return None;
    }
    Some(normalize_name(trimmed))
}

/// Uppercases and strips everything but letters and single spaces.
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphabetic() || c.is_whitespace() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
