use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::{error, info};

use crate::extraction::{ExpiryExtractor, LicenseNameMatcher, LicenseTypeDetector};
use crate::models::{ImageFile, LicenseVerificationResult, Orientation};
use crate::processing::{ImageNormalizer, OrientationSearch};
use crate::utils::VerificationError;

/// Header printed on every genuine Malta firearms license.
pub const LICENSE_HEADER: &str = "POLICE GENERAL HEADQUARTERS";

/// Verifies firearms license images: orientation-corrected OCR, header
/// check, expiry check, holder-name match and category classification.
pub struct LicenseVerifier;

impl LicenseVerifier {
    /// Verifies a license image against an optional profile name.
    ///
    /// Never returns an error: OCR is probabilistic and must not be the
    /// sole gate on a legitimate upload, so any internal failure is logged
    /// and collapsed into a conservative unverified result (`is_expired`
    /// assumed true, orientation unknown) that the caller can still present.
    /// Callers wanting a time bound must impose it themselves; this call
    /// blocks for up to four OCR passes.
    pub fn verify(
        file: &ImageFile,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> LicenseVerificationResult {
        match Self::verify_inner(file, first_name, last_name) {
            Ok(result) => result,
            Err(e) => {
                error!("license verification failed: {}", e);
                LicenseVerificationResult::failed()
            }
        }
    }

    fn verify_inner(
        file: &ImageFile,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<LicenseVerificationResult, VerificationError> {
        // Identity on anything already JPEG/PNG; coordinators normally
        // convert before calling, so this only fires on direct library use.
        let file = ImageNormalizer::convert_heic_to_jpeg(file.clone())?;

        let orientation = OrientationSearch::find_best(&file.bytes)?;

        // The winning pass's text is reused for every extractor below; OCR
        // is never re-run.
        let mut result = Self::verify_text(&orientation.text, first_name, last_name);

        result.orientation = orientation.orientation();
        result.rotation_angle = orientation.angle;
        if orientation.angle != 0 {
            result.corrected_image_url = Some(Self::data_url(&orientation.image));
        }

        info!(
            "license verdict: verified={} expired={} name_match={} angle={}",
            result.is_verified, result.is_expired, result.name_match, result.rotation_angle
        );

        Ok(result)
    }

    /// Text-level verification: everything derivable from the OCR text
    /// alone. Orientation fields are left at their defaults for the image
    /// layer to fill in.
    pub fn verify_text(
        text: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> LicenseVerificationResult {
        let header_found = Self::contains_header(text);
        let expiry = ExpiryExtractor::check(text);
        let names = LicenseNameMatcher::verify(text, first_name, last_name);
        let license_types = LicenseTypeDetector::detect(text);

        // Derived, never set directly: genuine header, unexpired, and the
        // name matches (or there was no profile name to compare).
        let is_verified = header_found && !expiry.is_expired && names.name_match;

        LicenseVerificationResult {
            is_verified,
            text: text.to_string(),
            is_expired: expiry.is_expired,
            expiry_date: expiry.expiry_date,
            orientation: Orientation::Correct,
            rotation_angle: 0,
            corrected_image_url: None,
            has_date: expiry.has_date,
            name_match: names.name_match,
            extracted_name: names.extracted_name,
            name_match_details: names.details,
            license_types,
        }
    }

    pub fn contains_header(text: &str) -> bool {
        text.to_uppercase().contains(LICENSE_HEADER)
    }

    fn data_url(jpeg_bytes: &[u8]) -> String {
        format!("data:image/jpeg;base64,{}", BASE64.encode(jpeg_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_LICENSE_TEXT: &str = "\
POLICE GENERAL HEADQUARTERS
Target Shooter Licence A
Isem u Kunjom: JOHN BORG
Valida sa: 15/06/2098";

    #[test]
    fn test_clean_license_verifies() {
        let result = LicenseVerifier::verify_text(VALID_LICENSE_TEXT, Some("John"), Some("Borg"));
        assert!(result.is_verified);
        assert!(!result.is_expired);
        assert!(result.has_date);
        assert_eq!(result.expiry_date.as_deref(), Some("2098-06-15"));
        assert!(result.name_match);
        assert!(result.license_types.tsl_a);
    }

    #[test]
    fn test_missing_header_fails() {
        let text = "Isem u Kunjom: JOHN BORG\nValida sa: 15/06/2098";
        let result = LicenseVerifier::verify_text(text, Some("John"), Some("Borg"));
        assert!(!result.is_verified);
        assert!(result.name_match, "name still matches; only the header is missing");
    }

    #[test]
    fn test_expired_license_fails() {
        let text = "POLICE GENERAL HEADQUARTERS\nIsem u Kunjom: JOHN BORG\nValida sa: 15/06/2001";
        let result = LicenseVerifier::verify_text(text, Some("John"), Some("Borg"));
        assert!(!result.is_verified);
        assert!(result.is_expired);
        assert_eq!(result.expiry_date.as_deref(), Some("2001-06-15"));
    }

    #[test]
    fn test_name_mismatch_fails_but_reports_fields() {
        let result = LicenseVerifier::verify_text(VALID_LICENSE_TEXT, Some("Peter"), Some("Vella"));
        assert!(!result.is_verified);
        assert!(!result.name_match);
        assert!(!result.is_expired, "expiry is independent of the name check");
        assert_eq!(result.extracted_name.as_deref(), Some("JOHN BORG"));
    }

    #[test]
    fn test_no_profile_name_never_fails_on_name() {
        let result = LicenseVerifier::verify_text(VALID_LICENSE_TEXT, None, None);
        assert!(result.name_match);
        assert!(result.is_verified);
    }

    #[test]
    fn test_missing_date_fails_open() {
        let text = "POLICE GENERAL HEADQUARTERS\nIsem u Kunjom: JOHN BORG";
        let result = LicenseVerifier::verify_text(text, Some("John"), Some("Borg"));
        assert!(!result.has_date);
        assert!(!result.is_expired);
        assert!(result.is_verified, "a missed date must not block verification");
    }

    #[test]
    fn test_contains_header() {
        assert!(LicenseVerifier::contains_header("xx POLICE GENERAL HEADQUARTERS xx"));
        assert!(LicenseVerifier::contains_header("police general headquarters"));
        assert!(!LicenseVerifier::contains_header("POLICE STATION"));
    }

    #[test]
    fn test_failed_result_is_conservative() {
        let result = crate::models::LicenseVerificationResult::failed();
        assert!(!result.is_verified);
        assert!(result.is_expired);
        assert_eq!(result.orientation, Orientation::Unknown);
    }
}
