use lazy_static::lazy_static;
use regex::Regex;

use crate::models::LicenseTypes;

lazy_static! {
    // Category wordings as printed on Malta firearms licenses. OCR output
    // is lowercased before matching.
    static ref TSL_A_SPECIAL: Regex =
        Regex::new(r"target\s+shooter.{0,30}licen[cs]e\s*a.{0,20}special|tsl\s*[-]?\s*a\s*[-]?\s*special").unwrap();
    static ref TSL_A: Regex =
        Regex::new(r"target\s+shooter.{0,30}licen[cs]e\s*a\b|tsl\s*[-]?\s*a\b").unwrap();
    static ref TSL_B: Regex =
        Regex::new(r"target\s+shooter.{0,30}licen[cs]e\s*b\b|tsl\s*[-]?\s*b\b").unwrap();
    static ref HUNTING: Regex =
        Regex::new(r"hunting\s+licen[cs]e|licen[zcs]ja\s+tal\s*[-]?\s*ka[cċ]+a").unwrap();
    static ref COLLECTORS_A_SPECIAL: Regex =
        Regex::new(r"collector.{0,5}s?\s+licen[cs]e\s*a.{0,20}special").unwrap();
    static ref COLLECTORS_A: Regex =
        Regex::new(r"collector.{0,5}s?\s+licen[cs]e\s*a\b").unwrap();
}

/// Classifies which Malta firearms license categories appear in the OCR
/// text. Pure classification: same text, same result, no OCR re-invocation.
pub struct LicenseTypeDetector;

impl LicenseTypeDetector {
    /// The special variants are evaluated first and suppress their base
    /// category, so a "Licence A Special" never also reports plain "A".
    /// Unrelated categories coexist freely.
    pub fn detect(text: &str) -> LicenseTypes {
        let lower = text.to_lowercase();

        let tsl_a_special = TSL_A_SPECIAL.is_match(&lower);
        let tsl_a = !tsl_a_special && TSL_A.is_match(&lower);

        let collectors_a_special = COLLECTORS_A_SPECIAL.is_match(&lower);
        let collectors_a = !collectors_a_special && COLLECTORS_A.is_match(&lower);

        LicenseTypes {
            tsl_a,
            tsl_a_special,
            tsl_b: TSL_B.is_match(&lower),
            hunting: HUNTING.is_match(&lower),
            collectors_a,
            collectors_a_special,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_tsl_a() {
        let types = LicenseTypeDetector::detect("Target Shooter Licence A");
        assert!(types.tsl_a);
        assert!(!types.tsl_a_special);
    }

    #[test]
    fn test_special_suppresses_base() {
        let types = LicenseTypeDetector::detect("Target Shooter Licence A Special");
        assert!(types.tsl_a_special);
        assert!(!types.tsl_a, "special must suppress the base category");
    }

    #[test]
    fn test_collectors_special_suppresses_base() {
        let types = LicenseTypeDetector::detect("Collectors Licence A Special");
        assert!(types.collectors_a_special);
        assert!(!types.collectors_a);

        let types = LicenseTypeDetector::detect("Collectors Licence A");
        assert!(types.collectors_a);
        assert!(!types.collectors_a_special);
    }

    #[test]
    fn test_unrelated_categories_coexist() {
        let types = LicenseTypeDetector::detect("Target Shooter Licence B and Hunting Licence");
        assert!(types.tsl_b);
        assert!(types.hunting);
        assert!(!types.tsl_a);
    }

    #[test]
    fn test_exclusivity_invariant_over_sample_texts() {
        let samples = [
            "",
            "tsl a",
            "tsl a special",
            "tsl-a-special tsl b",
            "Target Shooter License A Special, Collectors Licence A",
            "Collectors Licence A Special Hunting Licence",
            "target shooter licence a target shooter licence a special",
        ];
        for text in samples {
            let types = LicenseTypeDetector::detect(text);
            assert!(
                !(types.tsl_a && types.tsl_a_special),
                "exclusivity violated for {:?}",
                text
            );
            assert!(
                !(types.collectors_a && types.collectors_a_special),
                "exclusivity violated for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_case_insensitive_via_lowercasing() {
        let types = LicenseTypeDetector::detect("HUNTING LICENCE");
        assert!(types.hunting);
    }

    #[test]
    fn test_maltese_hunting_wording() {
        let types = LicenseTypeDetector::detect("Licenzja tal-Kacca");
        assert!(types.hunting);
    }

    #[test]
    fn test_american_spelling() {
        let types = LicenseTypeDetector::detect("target shooter license b");
        assert!(types.tsl_b);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(LicenseTypeDetector::detect(""), LicenseTypes::default());
    }
}
