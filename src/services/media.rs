use crate::error::AppError;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Extensions offered by the upload picker.
pub const UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tiff"];

const PREVIEW_SIZE: u32 = 480;
const PREVIEW_QUALITY: u8 = 75;

pub fn is_supported_upload(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| UPLOAD_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read an uploaded file, refusing extensions the picker would not offer.
pub async fn read_upload(path: &Path) -> Result<Vec<u8>, AppError> {
    if !is_supported_upload(path) {
        return Err(format!(
            "Unsupported image type {} (expected one of: {})",
            path.display(),
            UPLOAD_EXTENSIONS.join(", ")
        )
        .into());
    }
    tokio::fs::read(path).await.map_err(|e| AppError {
        message: format!("Failed to read image {}: {}", path.display(), e),
    })
}

/// Decode submitted bytes, upright them per EXIF and convert to RGB.
pub fn decode_submission(bytes: &[u8]) -> Result<DynamicImage, AppError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AppError {
            message: format!("Failed to read image: {}", e),
        })?
        .decode()
        .map_err(|e| AppError {
            message: format!("Failed to decode image: {}", e),
        })?;

    let orientation = read_orientation(bytes);
    if orientation != 1 {
        tracing::debug!(orientation, "applying EXIF orientation");
    }
    let img = apply_orientation(img, orientation);

    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

/// EXIF orientation tag of the image, defaulting to 1 (upright).
pub fn read_orientation(bytes: &[u8]) -> u32 {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(e) => e,
        Err(_) => return 1,
    };

    match exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY) {
        Some(field) => match field.value {
            exif::Value::Short(ref v) => *v.first().unwrap_or(&1) as u32,
            exif::Value::Long(ref v) => *v.first().unwrap_or(&1),
            _ => 1,
        },
        None => 1,
    }
}

pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.fliph().rotate90(),
        6 => img.rotate90(),
        7 => img.fliph().rotate270(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Small JPEG rendition of the submitted image as a base64 data URI.
pub fn preview_data_uri(img: &DynamicImage) -> Result<String, AppError> {
    let preview = if img.width() > PREVIEW_SIZE || img.height() > PREVIEW_SIZE {
        img.resize(PREVIEW_SIZE, PREVIEW_SIZE, FilterType::Triangle)
    } else {
        img.clone()
    };

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, PREVIEW_QUALITY);
    DynamicImage::ImageRgb8(preview.to_rgb8())
        .write_with_encoder(encoder).map_err(|e| AppError {
        message: format!("Failed to encode preview: {}", e),
    })?;

    let b64 = base64::engine::general_purpose::STANDARD.encode(buffer.into_inner());
    Ok(format!("data:image/jpeg;base64,{}", b64))
}
