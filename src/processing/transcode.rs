//! Decode → bound → re-encode pipeline shaping images for the gateway and
//! for the 4K download.

use image::imageops::FilterType;
use image::codecs::jpeg::JpegEncoder;

use crate::core::EncodedImage;
use crate::utils::TranscodeError;

type Result<T> = std::result::Result<T, TranscodeError>;

/// Long-side bound for images sent to the model. Keeps upload size and
/// remote latency in check without visibly degrading the result.
const UPLOAD_MAX_DIMENSION: u32 = 1536;

/// Long-side target for the download path (approx. 4K UHD).
const DOWNLOAD_MAX_DIMENSION: u32 = 3840;

const DOWNLOAD_QUALITY: u8 = 92;

/// How a transcode run bounds and re-encodes its input.
#[derive(Debug, Clone, Copy)]
pub struct TranscodeProfile {
    pub max_dimension: u32,
    /// JPEG quality, 1-100
    pub quality: u8,
    pub filter: FilterType,
    /// Whether an image smaller than the bound is scaled up to it
    pub enlarge: bool,
}

impl TranscodeProfile {
    /// Shapes an upload before it goes to the model: bounded to a moderate
    /// long side and never enlarged.
    pub fn upload(quality: u8) -> Self {
        Self {
            max_dimension: UPLOAD_MAX_DIMENSION,
            quality,
            filter: FilterType::Triangle,
            enlarge: false,
        }
    }

    /// Prepares the finished result for saving: scaled to a 4K long side
    /// with a high-quality resampler.
    pub fn download_4k() -> Self {
        Self {
            max_dimension: DOWNLOAD_MAX_DIMENSION,
            quality: DOWNLOAD_QUALITY,
            filter: FilterType::Lanczos3,
            enlarge: true,
        }
    }
}

/// Decodes `bytes`, scales so the longer side matches the profile bound
/// (aspect ratio preserved), and re-encodes as JPEG.
///
/// Images already within the bound are left at their original dimensions
/// unless the profile enlarges.
pub fn transcode(bytes: &[u8], profile: &TranscodeProfile) -> Result<EncodedImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| TranscodeError::decode(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());
    let (target_w, target_h) =
        bounded_dimensions(width, height, profile.max_dimension, profile.enlarge);

    let resized = if (target_w, target_h) == (width, height) {
        decoded
    } else {
        decoded.resize_exact(target_w, target_h, profile.filter)
    };

    // JPEG has no alpha channel; flatten unconditionally.
    let rgb = resized.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, profile.quality)
        .encode_image(&rgb)
        .map_err(|e| TranscodeError::encode(e.to_string()))?;

    Ok(EncodedImage::new(out, "image/jpeg"))
}

/// Scales (w, h) so the longer side equals `max`, preserving aspect ratio.
///
/// Already-bounded inputs pass through unchanged unless `enlarge` is set.
fn bounded_dimensions(width: u32, height: u32, max: u32, enlarge: bool) -> (u32, u32) {
    let long_side = width.max(height);
    if long_side == 0 || (long_side <= max && !enlarge) {
        return (width, height);
    }

    if width >= height {
        let scaled = (height as f64 * max as f64 / width as f64).round() as u32;
        (max, scaled.max(1))
    } else {
        let scaled = (width as f64 * max as f64 / height as f64).round() as u32;
        (scaled.max(1), max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 90, 60]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn decoded_dimensions(encoded: &EncodedImage) -> (u32, u32) {
        let img = image::load_from_memory(&encoded.bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn upload_profile_bounds_the_long_side() {
        let input = png_bytes(4000, 2000);
        let out = transcode(&input, &TranscodeProfile::upload(85)).unwrap();
        assert_eq!(out.media_type, "image/jpeg");
        assert_eq!(decoded_dimensions(&out), (1536, 768));
    }

    #[test]
    fn aspect_ratio_is_preserved_within_a_pixel() {
        let input = png_bytes(3001, 1000);
        let out = transcode(&input, &TranscodeProfile::upload(85)).unwrap();
        let (w, h) = decoded_dimensions(&out);
        assert_eq!(w, 1536);
        let expected = 1000.0 * 1536.0 / 3001.0;
        assert!((h as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn portrait_images_bound_on_height() {
        let input = png_bytes(1000, 4000);
        let out = transcode(&input, &TranscodeProfile::upload(85)).unwrap();
        assert_eq!(decoded_dimensions(&out), (384, 1536));
    }

    #[test]
    fn small_images_keep_their_dimensions_in_the_upload_profile() {
        let input = png_bytes(800, 600);
        let out = transcode(&input, &TranscodeProfile::upload(85)).unwrap();
        assert_eq!(decoded_dimensions(&out), (800, 600));
    }

    #[test]
    fn download_profile_enlarges_to_4k() {
        let input = png_bytes(1000, 500);
        let out = transcode(&input, &TranscodeProfile::download_4k()).unwrap();
        assert_eq!(decoded_dimensions(&out), (3840, 1920));
    }

    #[test]
    fn output_is_jpeg_regardless_of_input_format() {
        let input = png_bytes(100, 100);
        let out = transcode(&input, &TranscodeProfile::upload(85)).unwrap();
        assert_eq!(&out.bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker expected");
    }

    #[test]
    fn undecodable_input_is_a_decode_error() {
        let err = transcode(b"definitely not an image", &TranscodeProfile::upload(85)).unwrap_err();
        assert!(matches!(err, TranscodeError::Decode(_)));
    }

    #[test]
    fn bounded_dimensions_identity_when_within_bound() {
        assert_eq!(bounded_dimensions(1536, 1536, 1536, false), (1536, 1536));
        assert_eq!(bounded_dimensions(10, 20, 1536, false), (10, 20));
    }

    #[test]
    fn bounded_dimensions_never_collapse_to_zero() {
        assert_eq!(bounded_dimensions(10_000, 1, 1536, false), (1536, 1));
    }
}
