use log::{debug, info};

use crate::models::{OrientationCandidate, OrientationResult};
use crate::processing::image::ImageNormalizer;
use crate::processing::ocr::OcrEngine;
use crate::utils::VerificationError;

/// The four canonical angles, tried in this order on every call.
pub const ORIENTATION_ANGLES: [u16; 4] = [0, 90, 180, 270];

/// Words expected on a Malta firearms document. Engine confidence alone is a
/// weak orientation signal (a sideways image still OCRs stray characters
/// with moderate confidence), so keyword presence anchors the score.
const ORIENTATION_KEYWORDS: [&str; 6] =
    ["police", "valid", "headquarters", "license", "firearms", "malta"];

/// Score bonus per keyword found.
const KEYWORD_BONUS: f32 = 5.0;

/// JPEG quality for the per-angle re-encode fed to the engine.
const ROTATION_JPEG_QUALITY: u8 = 95;

/// Brute-force orientation search: OCR the image at 0/90/180/270 degrees
/// and keep the angle whose text scores best.
///
/// This is the most expensive step in a verification (up to four full OCR
/// passes) and runs synchronously; callers must keep it off any
/// latency-sensitive path and should impose their own upper time bound.
pub struct OrientationSearch;

impl OrientationSearch {
    /// Finds the best orientation for `image_bytes` (any decodable raster
    /// format). All four angles are always evaluated; there is no early
    /// exit, and ties keep the earliest angle (0 first).
    pub fn find_best(image_bytes: &[u8]) -> Result<OrientationResult, VerificationError> {
        Self::find_best_with_progress(image_bytes, &mut |_| {})
    }

    /// Variant reporting coarse progress in `[0, 100]` after each OCR pass,
    /// for callers rendering a progress bar across the blocking pipeline.
    pub fn find_best_with_progress<F>(
        image_bytes: &[u8],
        on_progress: &mut F,
    ) -> Result<OrientationResult, VerificationError>
    where
        F: FnMut(u8),
    {
        let decoded = image::load_from_memory(image_bytes)
            .map_err(|e| VerificationError::ImageProcessing(format!("failed to load image: {}", e)))?;

        let engine = OcrEngine::default();

        let mut candidates: Vec<OrientationCandidate> = Vec::with_capacity(ORIENTATION_ANGLES.len());
        let mut images: Vec<Vec<u8>> = Vec::with_capacity(ORIENTATION_ANGLES.len());

        for (i, &angle) in ORIENTATION_ANGLES.iter().enumerate() {
            let rotated = ImageNormalizer::rotate(&decoded, angle);
            let encoded = ImageNormalizer::encode_jpeg(&rotated, ROTATION_JPEG_QUALITY)?;

            let outcome = engine.recognize(&encoded)?;
            let keyword_score = Self::keyword_score(&outcome.text);

            debug!(
                "angle {}: confidence {:.0}, keyword score {:.0}",
                angle, outcome.confidence, keyword_score
            );

            candidates.push(OrientationCandidate {
                angle,
                text: outcome.text,
                confidence: outcome.confidence,
                keyword_score,
            });
            images.push(encoded);

            // Four evenly spaced ticks across the search.
            let pct = 48 + ((i + 1) * 20 / ORIENTATION_ANGLES.len()) as u8;
            on_progress(pct);
        }

        let best = Self::pick_best(&candidates);
        let winner = &candidates[best];

        info!(
            "orientation search picked {} degrees (score {:.0})",
            winner.angle,
            winner.combined_score()
        );

        Ok(OrientationResult {
            angle: winner.angle,
            image: images.swap_remove(best),
            text: winner.text.clone(),
            confidence: winner.confidence,
            combined_score: winner.combined_score(),
        })
    }

    /// Five points per document keyword present in the text,
    /// case-insensitively; each keyword counts once.
    pub fn keyword_score(text: &str) -> f32 {
        let lower = text.to_lowercase();
        let found = ORIENTATION_KEYWORDS
            .iter()
            .filter(|kw| lower.contains(*kw))
            .count();
        found as f32 * KEYWORD_BONUS
    }

    /// Index of the candidate with the strictly highest combined score.
    /// `>` rather than `>=`, so the first-seen angle wins ties.
    fn pick_best(candidates: &[OrientationCandidate]) -> usize {
        let mut best = 0;
        let mut best_score = candidates[0].combined_score();
        for (i, candidate) in candidates.iter().enumerate().skip(1) {
            let score = candidate.combined_score();
            if score > best_score {
                best = i;
                best_score = score;
            }
        }
        best
    }
}
