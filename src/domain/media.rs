//! MIME type helpers for product images

use base64::Engine;
use bytes::Bytes;
use image::ImageFormat;
use std::path::Path;

/// Served when a stored image has no recorded content type
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Longest MIME type the `image_type` column holds on every schema version
pub const MAX_CONTENT_TYPE_LENGTH: usize = 50;

/// True for any `image/*` MIME type
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Undo the base64 text encoding older rows used for `image_data`
///
/// Bytes that already look like an image, or that do not decode to one,
/// are returned unchanged.
pub fn decode_legacy_inline(data: Bytes) -> Bytes {
    if image::guess_format(&data).is_ok() {
        return data;
    }

    let text = data.iter().filter(|b| !b.is_ascii_whitespace()).copied().collect::<Vec<u8>>();
    match base64::engine::general_purpose::STANDARD.decode(&text) {
        Ok(decoded) if image::guess_format(&decoded).is_ok() => Bytes::from(decoded),
        _ => data,
    }
}

/// Guess a MIME type from a file path's extension
pub fn mime_from_path(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    if ext == "svg" {
        return Some("image/svg+xml");
    }

    match ImageFormat::from_extension(&ext)? {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        ImageFormat::Ico => Some("image/x-icon"),
        ImageFormat::Tiff => Some("image/tiff"),
        ImageFormat::Avif => Some("image/avif"),
        _ => None,
    }
}

/// File extension for a stored object
///
/// Prefers a short alphanumeric extension from the client filename, then
/// falls back to one derived from the MIME type.
pub fn extension_for(filename: Option<&str>, mime: &str) -> String {
    let from_name = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(ext) = from_name {
        return ext;
    }

    let ext = match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        "image/tiff" => "tiff",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        _ => "bin",
    };
    ext.to_string()
}
