use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;

use crate::extraction::IdCardNameMatcher;
use crate::models::{IdCardVerificationResult, ImageFile};
use crate::processing::{ImageNormalizer, OrientationSearch};
use crate::utils::VerificationError;

/// Structural pattern hits required before a document counts as a Malta
/// identity card at all.
pub const MIN_STRUCTURAL_MATCHES: usize = 2;

lazy_static! {
    // Field labels, headers and formats found on Malta identity cards,
    // bilingual where the card is. OCR rarely surfaces all of them, which
    // is why the gate only asks for MIN_STRUCTURAL_MATCHES.
    static ref ID_CARD_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)karta\s+ta'?l[-\s]?identit").unwrap(),
        Regex::new(r"(?i)identity\s+card").unwrap(),
        Regex::new(r"(?i)repubblika\s+ta'?\s+malta|republic\s+of\s+malta").unwrap(),
        Regex::new(r"(?i)\bmalta\b").unwrap(),
        // Document number: seven digits and a capital letter suffix.
        Regex::new(r"\b\d{7}[MGAPLHZ]\b").unwrap(),
        Regex::new(r"(?i)kunjom|surname").unwrap(),
        Regex::new(r"(?i)\bisem\b|\bname\b").unwrap(),
        Regex::new(r"(?i)\bsess\b|\bsex\b").unwrap(),
        Regex::new(r"(?i)nazzjonalit|nationality").unwrap(),
        Regex::new(r"(?i)data\s+tat[-\s]?twelid|date\s+of\s+birth").unwrap(),
        Regex::new(r"(?i)\bfirma\b|signature").unwrap(),
    ];
}

/// Verifies Malta identity card images: hologram-suppressing preprocessing,
/// orientation-corrected OCR, a structural-pattern gate and a name match.
///
/// Unlike the license path this propagates failures: ID-card upload gates
/// later access decisions, so an unverifiable card must block the caller
/// rather than quietly continue unverified.
pub struct IdCardVerifier;

impl IdCardVerifier {
    /// Verifies an ID card against the profile name, reporting coarse
    /// progress percentages (monotonically non-decreasing) through
    /// `on_progress`. Blocks for up to four OCR passes.
    pub fn verify<F>(
        file: &ImageFile,
        first_name: &str,
        last_name: &str,
        mut on_progress: F,
    ) -> Result<IdCardVerificationResult, VerificationError>
    where
        F: FnMut(u8),
    {
        let preprocessed = ImageNormalizer::preprocess_id_card_image(&file.bytes)
            .map_err(|e| VerificationError::IdCardVerification(e.to_string()))?;
        on_progress(42);
        on_progress(45);

        let orientation = OrientationSearch::find_best_with_progress(&preprocessed, &mut on_progress)
            .map_err(|e| VerificationError::IdCardVerification(e.to_string()))?;
        on_progress(70);

        let result = Self::verify_text(&orientation.text, first_name, last_name);
        on_progress(80);

        info!(
            "id card verdict: verified={} name_match={}",
            result.is_verified, result.name_match
        );

        Ok(result)
    }

    /// Text-level verification: the structural gate and the name match.
    pub fn verify_text(text: &str, first_name: &str, last_name: &str) -> IdCardVerificationResult {
        let structural_matches = Self::count_structural_matches(text);
        let names = IdCardNameMatcher::verify(text, first_name, last_name);

        debug!(
            "{} of {} structural patterns matched",
            structural_matches,
            ID_CARD_PATTERNS.len()
        );

        IdCardVerificationResult {
            is_verified: structural_matches >= MIN_STRUCTURAL_MATCHES && names.name_match,
            text: text.to_string(),
            name_match: names.name_match,
            extracted_name: names.extracted_name,
            name_match_details: names.details,
        }
    }

    /// How many of the card's structural patterns appear in the text.
    pub fn count_structural_matches(text: &str) -> usize {
        ID_CARD_PATTERNS.iter().filter(|p| p.is_match(text)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_ID_TEXT: &str = "\
REPUBBLIKA TA' MALTA
KARTA TAL-IDENTITA / IDENTITY CARD
0123456M
KUNJOM / SURNAME
BORG
ISEM / NAME
JOHN
SESS / SEX
M";

    #[test]
    fn test_structural_patterns_on_real_layout() {
        assert!(IdCardVerifier::count_structural_matches(VALID_ID_TEXT) >= MIN_STRUCTURAL_MATCHES);
    }

    #[test]
    fn test_structural_count_on_unrelated_text() {
        assert!(IdCardVerifier::count_structural_matches("grocery list: milk, eggs") == 0);
    }

    #[test]
    fn test_verified_card() {
        let result = IdCardVerifier::verify_text(VALID_ID_TEXT, "John", "Borg");
        assert!(result.is_verified);
        assert!(result.name_match);
    }

    #[test]
    fn test_too_few_structural_matches_fails_regardless_of_name() {
        // One weak hit at most; the structural gate fails before the name
        // check can matter.
        let text = "ISEM\nBORG\nJOHN";
        let matches = IdCardVerifier::count_structural_matches(text);
        assert!(matches < MIN_STRUCTURAL_MATCHES);
        let result = IdCardVerifier::verify_text(text, "John", "Borg");
        assert!(!result.is_verified);
    }

    #[test]
    fn test_name_mismatch_fails_verified_card() {
        let result = IdCardVerifier::verify_text(VALID_ID_TEXT, "Peter", "Vella");
        assert!(!result.is_verified);
        assert!(!result.name_match);
    }

    #[test]
    fn test_document_number_pattern() {
        assert_eq!(IdCardVerifier::count_structural_matches("0123456M"), 1);
        assert_eq!(IdCardVerifier::count_structural_matches("012345M"), 0);
    }
}
