use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::extraction::name::normalize_name;
use crate::matching::{levenshtein_distance, similarity_percent};
use crate::models::NameMatchDetails;

lazy_static! {
    // The bilingual name field header on Malta identity cards, e.g.
    // "ISEM / NAME" or "KUNJOM, ISEM / SURNAME, NAME".
    static ref ID_NAME_LABEL: Regex = Regex::new(r"(?i)isem.{0,20}name|kunjom.{0,20}surname").unwrap();

    // Field labels that follow the name block; reaching one of these means
    // the name lines are over.
    static ref STOP_LABEL: Regex =
        Regex::new(r"(?i)sess|sex|nazzjonalit|nationality|data|date|firma|signature").unwrap();

    // A Malta identity card document number: seven digits and a letter.
    static ref DOCUMENT_NUMBER: Regex = Regex::new(r"(?i)\b\d{4,8}[A-Z]?\b").unwrap();

    // Other field-label words that disqualify a candidate name line.
    static ref FIELD_LABEL: Regex =
        Regex::new(r"(?i)karta|identit|identity|malta|repubblika|republic|card|isem|name|kunjom|surname").unwrap();
}

/// Fraction of a candidate line that must be alphabetic. ID-card OCR is
/// noisy; hologram artifacts read as digits and symbols.
const MIN_ALPHABETIC_DENSITY: f64 = 0.70;

/// Surname and first name usually sit on separate lines, so up to this many
/// lines are collected after the label.
const MAX_NAME_LINES: usize = 2;

/// Extracts the holder name from identity card OCR text and compares it to
/// the profile name with a length-proportional edit-distance tolerance,
/// looser than the license matcher.
pub struct IdCardNameMatcher;

/// Outcome of the ID-card name comparison.
#[derive(Debug, Clone)]
pub struct IdCardNameVerification {
    pub name_match: bool,
    pub extracted_name: Option<String>,
    pub details: Option<NameMatchDetails>,
}

impl IdCardNameMatcher {
    pub fn verify(text: &str, first_name: &str, last_name: &str) -> IdCardNameVerification {
        let extracted = match Self::extract(text) {
            Some(name) => name,
            None => {
                debug!("no holder name found on identity card");
                return IdCardNameVerification {
                    name_match: false,
                    extracted_name: None,
                    details: None,
                };
            }
        };

        let normalized = normalize_name(&extracted);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        let first_found = Self::token_matches(&tokens, first_name);
        let last_found = Self::token_matches(&tokens, last_name);

        let profile_name = format!("{} {}", first_name, last_name)
            .trim()
            .to_uppercase();
        let details = NameMatchDetails {
            extracted_name: normalized.clone(),
            profile_name: profile_name.clone(),
            similarity_score: similarity_percent(&normalized, &profile_name),
        };

        IdCardNameVerification {
            name_match: first_found && last_found,
            extracted_name: Some(normalized),
            details: Some(details),
        }
    }

    /// A profile name part matches if some document token is within
    /// `max(1, 0.25 * len)` edits of it.
    fn token_matches(tokens: &[&str], profile_part: &str) -> bool {
        let part = profile_part.trim().to_uppercase();
        if part.is_empty() {
            return true;
        }
        let tolerance = ((part.chars().count() as f64 * 0.25).floor() as usize).max(1);
        tokens
            .iter()
            .any(|t| levenshtein_distance(t, &part) <= tolerance)
    }

    /// Collects the name block after (or inline with) the name field label.
    /// Surname and first name often occupy separate lines, so up to
    /// [`MAX_NAME_LINES`] valid consecutive lines are joined; a known
    /// subsequent field label stops the collection early.
    pub fn extract(text: &str) -> Option<String> {
        let lines: Vec<&str> = text.lines().collect();
        let label_idx = lines.iter().position(|l| ID_NAME_LABEL.is_match(l))?;

        let mut collected: Vec<String> = Vec::new();

        // Inline remainder of the label line.
        if let Some(m) = ID_NAME_LABEL.find(lines[label_idx]) {
            let remainder = lines[label_idx][m.end()..]
                .trim_start_matches(|c: char| c == ':' || c == '/' || c == '-' || c.is_whitespace());
            if Self::is_valid_name_line(remainder) {
                collected.push(remainder.trim().to_string());
            }
        }

        for line in lines.iter().skip(label_idx + 1) {
            if collected.len() >= MAX_NAME_LINES {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            // Surname and first name carry their own headers on the card;
            // a further name-field header continues the block.
            if ID_NAME_LABEL.is_match(trimmed) {
                continue;
            }
            if STOP_LABEL.is_match(trimmed) {
                break;
            }
            if Self::is_valid_name_line(trimmed) {
                collected.push(trimmed.to_string());
            } else if !collected.is_empty() {
                // The name block is contiguous; any other invalid line ends
                // it.
                break;
            }
        }

        if collected.is_empty() {
            None
        } else {
            Some(collected.join(" "))
        }
    }

    /// A line can be part of the name block: at least two characters,
    /// mostly letters, and not a document number or field label.
    fn is_valid_name_line(line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.chars().count() < 2 {
            return false;
        }

        let total = trimmed.chars().filter(|c| !c.is_whitespace()).count();
        if total == 0 {
            return false;
        }
        let alphabetic = trimmed.chars().filter(|c| c.is_alphabetic()).count();
        if (alphabetic as f64 / total as f64) < MIN_ALPHABETIC_DENSITY {
            return false;
        }

        if DOCUMENT_NUMBER.is_match(trimmed) {
            return false;
        }
        if FIELD_LABEL.is_match(trimmed) {
            return false;
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_two_lines_after_label() {
        let text = "KARTA TAL-IDENTITA\nISEM / NAME\nBORG\nJOHN\nSESS / SEX\nM";
        assert_eq!(IdCardNameMatcher::extract(text).as_deref(), Some("BORG JOHN"));
    }

    #[test]
    fn test_extract_interleaved_surname_and_name_headers() {
        let text = "KUNJOM / SURNAME\nBORG\nISEM / NAME\nJOHN\nSESS / SEX";
        assert_eq!(IdCardNameMatcher::extract(text).as_deref(), Some("BORG JOHN"));
    }

    #[test]
    fn test_extract_stops_at_field_label() {
        let text = "ISEM / NAME\nBORG\nNAZZJONALITA\nMALTESE";
        assert_eq!(IdCardNameMatcher::extract(text).as_deref(), Some("BORG"));
    }

    #[test]
    fn test_extract_inline_name() {
        let text = "ISEM / NAME: BORG JOHN\nSESS M";
        assert_eq!(IdCardNameMatcher::extract(text).as_deref(), Some("BORG JOHN"));
    }

    #[test]
    fn test_extract_skips_document_number() {
        let text = "ISEM / NAME\n0123456M\nBORG\nJOHN";
        // The number line is invalid; collection starts at the first valid
        // line and takes two.
        assert_eq!(IdCardNameMatcher::extract(text).as_deref(), Some("BORG JOHN"));
    }

    #[test]
    fn test_extract_rejects_low_alpha_density() {
        assert!(!IdCardNameMatcher::is_valid_name_line("B0R6 12345"));
        assert!(IdCardNameMatcher::is_valid_name_line("BORG"));
    }

    #[test]
    fn test_no_label_yields_none() {
        assert_eq!(IdCardNameMatcher::extract("just some text"), None);
    }

    #[test]
    fn test_verify_exact() {
        let text = "ISEM / NAME\nBORG\nJOHN\nSESS";
        let v = IdCardNameMatcher::verify(text, "John", "Borg");
        assert!(v.name_match);
        assert_eq!(v.extracted_name.as_deref(), Some("BORG JOHN"));
    }

    #[test]
    fn test_verify_tolerates_proportional_edits() {
        // VELLACH vs VELLACI: one edit, tolerance for len 7 is 1.
        let text = "ISEM / NAME\nVELLACI\nJOHN\nSESS";
        let v = IdCardNameMatcher::verify(text, "John", "Vellach");
        assert!(v.name_match);
    }

    #[test]
    fn test_verify_rejects_beyond_tolerance() {
        // BORG vs CAMI: four edits, tolerance for len 4 is 1.
        let text = "ISEM / NAME\nCAMI\nJOHN\nSESS";
        let v = IdCardNameMatcher::verify(text, "John", "Borg");
        assert!(!v.name_match);
    }

    #[test]
    fn test_verify_no_name_found() {
        let v = IdCardNameMatcher::verify("no labels here", "John", "Borg");
        assert!(!v.name_match);
        assert!(v.extracted_name.is_none());
        assert!(v.details.is_none());
    }
}
