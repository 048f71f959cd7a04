use std::io::Write;

use log::debug;
use tempfile::Builder;
use tesseract::Tesseract;

use crate::utils::VerificationError;

/// Text plus the engine's mean per-result confidence for one recognition
/// pass.
#[derive(Debug, Clone)]
pub struct OcrOutcome {
    pub text: String,
    /// Mean word confidence, 0–100.
    pub confidence: f32,
}

/// Thin wrapper over the Tesseract engine.
///
/// Each [`recognize`](OcrEngine::recognize) call creates its own engine
/// instance and drops it at scope exit, on success and error paths alike, so
/// no worker leaks across calls. Calls are strictly sequential within one
/// verification; independent verifications get independent instances.
pub struct OcrEngine {
    language: String,
}

impl Default for OcrEngine {
    fn default() -> Self {
        OcrEngine::new("eng")
    }
}

impl OcrEngine {
    pub fn new(language: impl Into<String>) -> Self {
        OcrEngine {
            language: language.into(),
        }
    }

    /// Runs one OCR pass over encoded image bytes. The engine reads from a
    /// file, so the bytes go through a named temp file first.
    pub fn recognize(&self, image_bytes: &[u8]) -> Result<OcrOutcome, VerificationError> {
        let mut temp_file = Builder::new()
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| VerificationError::Ocr(format!("failed to create temp file: {}", e)))?;

        temp_file
            .write_all(image_bytes)
            .map_err(|e| VerificationError::Ocr(format!("failed to write temp file: {}", e)))?;

        let path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| VerificationError::Ocr("temp path is not valid UTF-8".to_string()))?;

        let mut tess = Tesseract::new(None, Some(&self.language))
            .map_err(|e| VerificationError::Ocr(format!("engine init failed: {}", e)))?
            .set_image(path)
            .map_err(|e| VerificationError::Ocr(format!("failed to set image: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| VerificationError::Ocr(format!("recognition failed: {}", e)))?;
        let confidence = tess.mean_text_conf() as f32;
        let confidence = confidence.clamp(0.0, 100.0);

        debug!(
            "OCR pass: {} chars, mean confidence {:.0}",
            text.len(),
            confidence
        );

        Ok(OcrOutcome { text, confidence })
    }
}
