use thiserror::Error;

/// Errors surfaced by the verification core.
///
/// The license path swallows `Ocr` and `ImageProcessing` internally and
/// degrades to an unverified result; the ID-card path propagates everything.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Unsupported image type: {0}. Please upload a JPEG, PNG or HEIC image")]
    InvalidImageType(String),

    #[error("Image is too large ({size_mb:.1} MB). Maximum allowed size is {limit_mb} MB")]
    ImageTooLarge { size_mb: f64, limit_mb: u32 },

    #[error("Could not convert HEIC image: {0}. Try uploading a JPEG or PNG instead")]
    HeicConversion(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("OCR engine error: {0}")]
    Ocr(String),

    #[error("Failed to verify ID card: {0}")]
    IdCardVerification(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
