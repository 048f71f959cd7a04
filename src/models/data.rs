use serde::Serialize;

/// An uploaded image: raw bytes plus the metadata the caller's file layer
/// provides. Treated as immutable for the duration of a verification call.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        ImageFile {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Orientation of the input relative to the best OCR result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Correct,
    Rotated,
    Unknown,
}

/// One rotation attempt during orientation search.
#[derive(Debug, Clone)]
pub struct OrientationCandidate {
    pub angle: u16,
    pub text: String,
    pub confidence: f32,
    pub keyword_score: f32,
}

impl OrientationCandidate {
    pub fn combined_score(&self) -> f32 {
        self.confidence + self.keyword_score
    }
}

/// Winner of the orientation search: the rotated image (JPEG bytes) and the
/// OCR output that scored best across the four canonical angles.
#[derive(Debug, Clone)]
pub struct OrientationResult {
    pub angle: u16,
    pub image: Vec<u8>,
    pub text: String,
    pub confidence: f32,
    pub combined_score: f32,
}

impl OrientationResult {
    pub fn orientation(&self) -> Orientation {
        if self.angle == 0 {
            Orientation::Correct
        } else {
            Orientation::Rotated
        }
    }
}

/// Outcome of expiry-date extraction. Absence of a date fails open:
/// `has_date: false, is_expired: false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryCheck {
    pub is_expired: bool,
    /// ISO `YYYY-MM-DD` when a date was found and parsed.
    pub expiry_date: Option<String>,
    pub has_date: bool,
}

impl ExpiryCheck {
    pub fn no_date() -> Self {
        ExpiryCheck {
            is_expired: false,
            expiry_date: None,
            has_date: false,
        }
    }
}

/// Malta firearms license categories detected on a document. The special
/// variants suppress their base category, so `tsl_a && tsl_a_special` and
/// `collectors_a && collectors_a_special` never both hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LicenseTypes {
    pub tsl_a: bool,
    pub tsl_a_special: bool,
    pub tsl_b: bool,
    pub hunting: bool,
    pub collectors_a: bool,
    pub collectors_a_special: bool,
}

impl LicenseTypes {
    pub fn any(&self) -> bool {
        self.tsl_a
            || self.tsl_a_special
            || self.tsl_b
            || self.hunting
            || self.collectors_a
            || self.collectors_a_special
    }
}

/// Diagnostic detail about a name comparison. The pass/fail decision uses
/// per-token thresholds, not this aggregate score.
#[derive(Debug, Clone, Serialize)]
pub struct NameMatchDetails {
    pub extracted_name: String,
    pub profile_name: String,
    pub similarity_score: u8,
}

/// Verdict for a firearms license image.
///
/// `is_verified` is derived: header text found AND not expired AND (name
/// matches OR no profile name was supplied). It is never set directly.
#[derive(Debug, Clone, Serialize)]
pub struct LicenseVerificationResult {
    pub is_verified: bool,
    pub text: String,
    pub is_expired: bool,
    pub expiry_date: Option<String>,
    pub orientation: Orientation,
    pub rotation_angle: u16,
    pub corrected_image_url: Option<String>,
    pub has_date: bool,
    pub name_match: bool,
    pub extracted_name: Option<String>,
    pub name_match_details: Option<NameMatchDetails>,
    pub license_types: LicenseTypes,
}

impl LicenseVerificationResult {
    /// Conservative result returned when the pipeline fails internally:
    /// nothing verified, expiry assumed, orientation unknown.
    pub fn failed() -> Self {
        LicenseVerificationResult {
            is_verified: false,
            text: String::new(),
            is_expired: true,
            expiry_date: None,
            orientation: Orientation::Unknown,
            rotation_angle: 0,
            corrected_image_url: None,
            has_date: false,
            name_match: false,
            extracted_name: None,
            name_match_details: None,
            license_types: LicenseTypes::default(),
        }
    }
}

/// Verdict for an identity card image. `is_verified` requires at least
/// [`crate::verification::MIN_STRUCTURAL_MATCHES`] structural pattern hits
/// AND a name match.
#[derive(Debug, Clone, Serialize)]
pub struct IdCardVerificationResult {
    pub is_verified: bool,
    pub text: String,
    pub name_match: bool,
    pub extracted_name: Option<String>,
    pub name_match_details: Option<NameMatchDetails>,
}
