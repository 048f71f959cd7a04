use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};
use log::{debug, info};

use crate::models::ImageFile;
use crate::utils::VerificationError;

/// Default upload size cap in megabytes.
pub const DEFAULT_MAX_SIZE_MB: u32 = 5;

/// Quality used when transcoding HEIC captures to JPEG.
const HEIC_JPEG_QUALITY: u8 = 90;

/// File type substrings accepted alongside a proper `image/*` MIME type.
const ACCEPTED_TYPE_HINTS: [&str; 5] = ["jpeg", "jpg", "png", "heic", "heif"];

/// Mid-gray split point of the ID-card contrast curve.
const CONTRAST_SPLIT: f32 = 128.0;

/// Image normalization ahead of OCR: HEIC transcoding, upload validation,
/// and the ID-card contrast curve.
pub struct ImageNormalizer;

impl ImageNormalizer {
    /// True when the file presents as HEIC/HEIF by MIME type or filename
    /// extension, case-insensitively.
    pub fn is_heic(file: &ImageFile) -> bool {
        let mime = file.content_type.to_lowercase();
        if mime.contains("heic") || mime.contains("heif") {
            return true;
        }
        let name = file.name.to_lowercase();
        name.ends_with(".heic") || name.ends_with(".heif")
    }

    /// Transcodes HEIC/HEIF captures (the iPhone default) to JPEG so the
    /// rest of the pipeline only sees raster formats the decoder handles.
    /// Non-HEIC input passes through untouched, making the operation
    /// idempotent.
    pub fn convert_heic_to_jpeg(file: ImageFile) -> Result<ImageFile, VerificationError> {
        if !Self::is_heic(&file) {
            return Ok(file);
        }

        info!("converting HEIC upload {} to JPEG", file.name);

        let rgb = Self::decode_heic(&file.bytes)
            .map_err(VerificationError::HeicConversion)?;

        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        let mut encoder = JpegEncoder::new_with_quality(&mut cursor, HEIC_JPEG_QUALITY);
        encoder
            .encode_image(&rgb)
            .map_err(|e| VerificationError::HeicConversion(e.to_string()))?;

        let stem = match file.name.rfind('.') {
            Some(idx) => &file.name[..idx],
            None => file.name.as_str(),
        };

        Ok(ImageFile {
            name: format!("{}.jpg", stem),
            content_type: "image/jpeg".to_string(),
            bytes: buffer,
        })
    }

    fn decode_heic(bytes: &[u8]) -> Result<image::RgbImage, String> {
        let lib_heif = LibHeif::new();
        let context = HeifContext::read_from_bytes(bytes).map_err(|e| e.to_string())?;
        let handle = context.primary_image_handle().map_err(|e| e.to_string())?;
        let decoded = lib_heif
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| e.to_string())?;

        let planes = decoded.planes();
        let interleaved = planes
            .interleaved
            .ok_or_else(|| "no interleaved plane in decoded HEIC".to_string())?;

        let (width, height) = (interleaved.width, interleaved.height);
        let stride = interleaved.stride;
        let data = interleaved.data;

        let mut rgb = image::RgbImage::new(width, height);
        for y in 0..height {
            let row = y as usize * stride;
            for x in 0..width {
                let i = row + x as usize * 3;
                rgb.put_pixel(x, y, image::Rgb([data[i], data[i + 1], data[i + 2]]));
            }
        }
        Ok(rgb)
    }

    /// Validates an upload before any OCR work. Accepts a proper `image/*`
    /// MIME type or a recognized type substring in MIME/filename; rejects
    /// files over `max_size_mb`.
    pub fn validate_image_file(file: &ImageFile, max_size_mb: u32) -> Result<(), VerificationError> {
        let mime = file.content_type.to_lowercase();
        let name = file.name.to_lowercase();

        let type_ok = mime.starts_with("image/")
            || ACCEPTED_TYPE_HINTS
                .iter()
                .any(|hint| mime.contains(hint) || name.contains(hint));
        if !type_ok {
            return Err(VerificationError::InvalidImageType(file.content_type.clone()));
        }

        let limit = max_size_mb as usize * 1024 * 1024;
        if file.size() > limit {
            return Err(VerificationError::ImageTooLarge {
                size_mb: file.size() as f64 / (1024.0 * 1024.0),
                limit_mb: max_size_mb,
            });
        }

        Ok(())
    }

    /// Preprocessing for Malta identity cards ahead of OCR. The holographic
    /// overlay reads as mid-tone noise, so the image is grayscaled
    /// (`0.299R + 0.587G + 0.114B`) and pushed through a two-band contrast
    /// stretch: pixels below mid-gray darken by 0.7, pixels at or above move
    /// halfway to white. Printed text survives; hologram artifacts wash out.
    /// Output is re-encoded losslessly as PNG.
    pub fn preprocess_id_card_image(bytes: &[u8]) -> Result<Vec<u8>, VerificationError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| VerificationError::ImageProcessing(format!("failed to load image: {}", e)))?;

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let mut out = image::GrayImage::new(width, height);

        for (x, y, pixel) in rgb.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            let gray = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            let stretched = if gray < CONTRAST_SPLIT {
                gray * 0.7
            } else {
                255.0 - (255.0 - gray) * 0.5
            };
            out.put_pixel(x, y, image::Luma([stretched.round() as u8]));
        }

        debug!("preprocessed {}x{} ID card image", width, height);

        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        DynamicImage::ImageLuma8(out)
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| {
                VerificationError::ImageProcessing(format!("failed to encode processed image: {}", e))
            })?;
        Ok(buffer)
    }

    /// Rotates by one of the four canonical angles. 90 and 270 swap the
    /// canvas dimensions.
    pub fn rotate(img: &DynamicImage, angle: u16) -> DynamicImage {
        match angle {
            90 => img.rotate90(),
            180 => img.rotate180(),
            270 => img.rotate270(),
            _ => img.clone(),
        }
    }

    /// JPEG-encodes at the given quality.
    pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, VerificationError> {
        let rgb = img.to_rgb8();
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        let mut encoder = JpegEncoder::new_with_quality(&mut cursor, quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| VerificationError::ImageProcessing(format!("failed to encode JPEG: {}", e)))?;
        Ok(buffer)
    }
}
