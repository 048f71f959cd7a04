pub mod image;
pub mod ocr;
pub mod orientation;

pub use image::ImageNormalizer;
pub use ocr::{OcrEngine, OcrOutcome};
pub use orientation::OrientationSearch;
