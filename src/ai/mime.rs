/// MIME type used when the image bytes are not recognized. Colposcope
/// captures are JPEG in practice.
pub const FALLBACK_IMAGE_MIME: &str = "image/jpeg";

/// Sniff the MIME type of an image from its magic bytes.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to {}",
                &bytes[..bytes.len().min(4)],
                FALLBACK_IMAGE_MIME
            );
            FALLBACK_IMAGE_MIME
        }
    }
}
