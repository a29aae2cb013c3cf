//! Upload intake checks.

use crate::core::UploadFile;
use crate::utils::error::ValidationError;

/// Accepts or rejects a user-provided file before it touches the session.
///
/// The declared media type is the acceptance criterion; content that later
/// turns out to be unreadable fails on the processing path instead.
pub fn ensure_image_upload(file: &UploadFile) -> Result<(), ValidationError> {
    if file.media_type.to_ascii_lowercase().starts_with("image/") {
        Ok(())
    } else {
        Err(ValidationError::NotAnImage(file.media_type.clone()))
    }
}

/// Derives a media type from magic bytes, for callers that only have raw
/// content (the CLI has no file picker to declare one). Magic bytes don't
/// lie; extensions can be wrong.
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: GIF8
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        // BMP: BM
        [b'B', b'M', ..] => Some("image/bmp"),
        // TIFF: little-endian (49 49 2A 00) or big-endian (4D 4D 00 2A)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Some("image/tiff"),
        // WebP: RIFF....WEBP
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(media_type: &str) -> UploadFile {
        UploadFile {
            file_name: "input".to_string(),
            media_type: media_type.to_string(),
            bytes: vec![0u8; 4],
        }
    }

    #[test]
    fn image_media_types_pass() {
        assert!(ensure_image_upload(&upload("image/jpeg")).is_ok());
        assert!(ensure_image_upload(&upload("image/png")).is_ok());
        assert!(ensure_image_upload(&upload("IMAGE/WEBP")).is_ok());
    }

    #[test]
    fn non_image_media_types_are_rejected() {
        let err = ensure_image_upload(&upload("application/pdf")).unwrap_err();
        assert!(matches!(err, ValidationError::NotAnImage(ref t) if t == "application/pdf"));
        assert!(ensure_image_upload(&upload("text/plain")).is_err());
        assert!(ensure_image_upload(&upload("")).is_err());
    }

    #[test]
    fn sniffs_common_image_signatures() {
        assert_eq!(sniff_media_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(
            sniff_media_type(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Some("image/png")
        );
        assert_eq!(sniff_media_type(b"RIFF\x10\x00\x00\x00WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_media_type(&[0x49, 0x49, 0x2A, 0x00]), Some("image/tiff"));
    }

    #[test]
    fn unknown_signatures_sniff_to_none() {
        assert_eq!(sniff_media_type(b"%PDF-1.7"), None);
        assert_eq!(sniff_media_type(&[]), None);
    }
}
