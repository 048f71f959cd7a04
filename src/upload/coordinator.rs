use log::{info, warn};

use crate::models::{IdCardVerificationResult, ImageFile, LicenseVerificationResult};
use crate::processing::image::DEFAULT_MAX_SIZE_MB;
use crate::processing::ImageNormalizer;
use crate::upload::storage::{content_key, ImageStore};
use crate::utils::VerificationError;
use crate::verification::{IdCardVerifier, LicenseVerifier};

/// Clamps a 0–100 progress stream to be monotonically non-decreasing
/// within one upload, whatever order the pipeline stages report in.
pub struct ProgressReporter<F: FnMut(u8)> {
    last: u8,
    callback: F,
}

impl<F: FnMut(u8)> ProgressReporter<F> {
    pub fn new(callback: F) -> Self {
        ProgressReporter { last: 0, callback }
    }

    pub fn report(&mut self, pct: u8) {
        let pct = pct.min(100);
        if pct <= self.last {
            return;
        }
        self.last = pct;
        (self.callback)(pct);
    }
}

/// A completed license upload: the verdict, where the image landed, and a
/// user-facing message.
#[derive(Debug)]
pub struct LicenseUpload {
    pub result: LicenseVerificationResult,
    pub image_url: String,
    pub message: String,
}

/// A completed identity card upload.
#[derive(Debug)]
pub struct IdCardUpload {
    pub result: IdCardVerificationResult,
    pub image_url: String,
    pub message: String,
}

/// Wraps the verification orchestrators with upload validation, storage
/// persistence, progress reporting and user-facing messaging.
///
/// The whole pipeline is blocking and can take several seconds (up to four
/// OCR passes); run it off any latency-sensitive path. The progress
/// callback fires at coarse milestones so a caller can render a bar.
pub struct UploadCoordinator<S: ImageStore> {
    store: S,
    max_size_mb: u32,
}

impl<S: ImageStore> UploadCoordinator<S> {
    pub fn new(store: S) -> Self {
        UploadCoordinator {
            store,
            max_size_mb: DEFAULT_MAX_SIZE_MB,
        }
    }

    pub fn with_max_size(store: S, max_size_mb: u32) -> Self {
        UploadCoordinator { store, max_size_mb }
    }

    /// Uploads a firearms license image. A recognized-but-unmatched license
    /// (expired, wrong name, unreadable fields) still uploads with
    /// `is_verified: false` and a manual-review message. Only bad input
    /// (type/size) or conversion/storage failures error out.
    pub fn upload_license<F>(
        &self,
        file: ImageFile,
        first_name: Option<&str>,
        last_name: Option<&str>,
        on_progress: F,
    ) -> Result<LicenseUpload, VerificationError>
    where
        F: FnMut(u8),
    {
        let mut progress = ProgressReporter::new(on_progress);

        ImageNormalizer::validate_image_file(&file, self.max_size_mb)?;
        progress.report(10);

        let file = ImageNormalizer::convert_heic_to_jpeg(file)?;
        progress.report(30);

        let result = LicenseVerifier::verify(&file, first_name, last_name);
        progress.report(70);

        if !result.is_verified {
            warn!("license upload proceeding unverified: {}", file.name);
        }

        let key = content_key(&file.bytes, extension_of(&file));
        let image_url = self.store.store(&key, &file.bytes, &file.content_type)?;
        progress.report(95);

        let message = license_message(&result);
        progress.report(100);

        info!("license upload complete: {} -> {}", file.name, image_url);

        Ok(LicenseUpload {
            result,
            image_url,
            message,
        })
    }

    /// Uploads an identity card image. Stricter than the license path: card
    /// upload gates later access decisions, so an unverifiable card blocks
    /// the upload with an error instead of persisting unverified.
    pub fn upload_id_card<F>(
        &self,
        file: ImageFile,
        first_name: &str,
        last_name: &str,
        on_progress: F,
    ) -> Result<IdCardUpload, VerificationError>
    where
        F: FnMut(u8),
    {
        let mut progress = ProgressReporter::new(on_progress);

        ImageNormalizer::validate_image_file(&file, self.max_size_mb)?;
        progress.report(10);

        let file = ImageNormalizer::convert_heic_to_jpeg(file)?;
        progress.report(30);

        let result =
            IdCardVerifier::verify(&file, first_name, last_name, |pct| progress.report(pct))?;

        if !result.is_verified {
            return Err(VerificationError::IdCardVerification(id_card_failure_reason(
                &result,
            )));
        }

        let key = content_key(&file.bytes, extension_of(&file));
        let image_url = self.store.store(&key, &file.bytes, &file.content_type)?;
        progress.report(95);

        let message = "Identity card uploaded and verified.".to_string();
        progress.report(100);

        info!("id card upload complete: {} -> {}", file.name, image_url);

        Ok(IdCardUpload {
            result,
            image_url,
            message,
        })
    }
}

fn extension_of(file: &ImageFile) -> &str {
    file.name
        .rsplit('.')
        .next()
        .filter(|ext| !ext.is_empty() && ext.len() <= 4)
        .unwrap_or("jpg")
}

/// Itemized, self-correctable verdict message for a license upload. Failed
/// checks are spelled out individually so the user knows whether to
/// re-photograph, fix their profile, or just wait for manual review.
pub fn license_message(result: &LicenseVerificationResult) -> String {
    if result.is_verified {
        return "License uploaded and verified.".to_string();
    }

    if result.text.is_empty() {
        return "License uploaded but could not be processed. It is pending manual review."
            .to_string();
    }

    let mut issues: Vec<String> = Vec::new();
    if !LicenseVerifier::contains_header(&result.text) {
        issues.push("the document header was not recognized".to_string());
    }
    if result.is_expired {
        match &result.expiry_date {
            Some(date) => issues.push(format!("the license expired on {}", date)),
            None => issues.push("the license appears to be expired".to_string()),
        }
    }
    if !result.name_match {
        issues.push("the name on the license did not match your profile".to_string());
    }
    if issues.is_empty() {
        issues.push("the document could not be read".to_string());
    }

    format!(
        "License uploaded but not verified: {}. It is pending manual review.",
        issues.join("; ")
    )
}

/// Why an identity card was rejected, for the hard-stop error path.
pub fn id_card_failure_reason(result: &IdCardVerificationResult) -> String {
    let structural =
        IdCardVerifier::count_structural_matches(&result.text) >= crate::verification::MIN_STRUCTURAL_MATCHES;
    if !structural {
        return "the image does not appear to be a Malta identity card".to_string();
    }
    if !result.name_match {
        return "the name on the identity card did not match your profile".to_string();
    }
    "the identity card could not be verified".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Orientation;
    use crate::verification::IdCardVerifier;

    #[test]
    fn test_progress_is_monotonic() {
        let mut seen = Vec::new();
        {
            let mut progress = ProgressReporter::new(|p| seen.push(p));
            for pct in [10, 30, 42, 30, 45, 45, 70, 200, 95] {
                progress.report(pct);
            }
        }
        assert_eq!(seen, vec![10, 30, 42, 45, 70, 100]);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_extension_of() {
        let f = ImageFile::new("scan.PNG", "image/png", vec![]);
        assert_eq!(extension_of(&f), "PNG");
        let f = ImageFile::new("noext", "image/jpeg", vec![]);
        assert_eq!(extension_of(&f), "jpg");
    }

    #[test]
    fn test_license_message_verified() {
        let text = "POLICE GENERAL HEADQUARTERS\nValida sa 15/06/2098";
        let result = LicenseVerifier::verify_text(text, None, None);
        assert_eq!(license_message(&result), "License uploaded and verified.");
    }

    #[test]
    fn test_license_message_itemizes_failures() {
        let text = "Isem u Kunjom: PETER VELLA\nValida sa 15/06/2001";
        let result = LicenseVerifier::verify_text(text, Some("John"), Some("Borg"));
        let message = license_message(&result);
        assert!(message.contains("header was not recognized"));
        assert!(message.contains("expired on 2001-06-15"));
        assert!(message.contains("did not match your profile"));
        assert!(message.contains("manual review"));
    }

    #[test]
    fn test_license_message_processing_failure() {
        let result = LicenseVerificationResult::failed();
        assert_eq!(result.orientation, Orientation::Unknown);
        assert!(license_message(&result).contains("could not be processed"));
    }

    #[test]
    fn test_id_card_failure_reason_structural() {
        let result = IdCardVerifier::verify_text("not a card", "John", "Borg");
        assert!(id_card_failure_reason(&result).contains("does not appear to be"));
    }

    #[test]
    fn test_id_card_failure_reason_name() {
        let text = "REPUBBLIKA TA' MALTA\nKARTA TAL-IDENTITA\nISEM / NAME\nPETER\nVELLA";
        let result = IdCardVerifier::verify_text(text, "John", "Borg");
        assert!(!result.name_match);
        assert!(id_card_failure_reason(&result).contains("did not match"));
    }
}
