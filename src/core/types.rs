//! Core types for the enhancement flow: operation kinds, screens and image payloads.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::utils::{ReviveError, TranscodeError, ValidationError};

/// The screen the front end is expected to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Upload,
    Selection,
    Processing,
    Result,
}

/// The enhancement the user picked.
///
/// A closed set: every behavior that differs per operation (directive text,
/// upload quality, UI strings) is a match in this impl block, so adding a
/// kind is a single localized change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Colorize,
    Upscale,
    Beauty,
    Custom,
}

impl OperationKind {
    /// Lowercase identifier used in file names and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Colorize => "colorize",
            Self::Upscale => "upscale",
            Self::Beauty => "beauty",
            Self::Custom => "custom",
        }
    }

    /// Builds the natural-language directive sent to the model.
    ///
    /// `instruction` is only consulted for [`OperationKind::Custom`].
    pub fn directive(&self, instruction: &str) -> String {
        match self {
            Self::Colorize => "Colorize this black and white image. Make the colors vibrant, \
                 realistic, and high definition. Maintain all details."
                .to_string(),
            Self::Upscale => "Upscale this image to high resolution 4K quality. Sharpen details, \
                 remove blur, remove noise, and enhance texture clarity significantly. \
                 Output a highly detailed, crisp image."
                .to_string(),
            Self::Beauty => "Professional beauty retouching. Smooth skin texture while keeping \
                 pores visible, brighten eyes, remove blemishes, enhance facial \
                 lighting for a studio look. Keep it natural but polished."
                .to_string(),
            Self::Custom => format!(
                "Modify this image based on this instruction: {}. \
                 Maintain high quality and realism.",
                instruction.trim()
            ),
        }
    }

    /// JPEG quality used when shaping the upload for this operation.
    ///
    /// Upscaling keeps more of the original data; the other operations
    /// trade a little quality for a smaller request.
    pub fn upload_quality(&self) -> u8 {
        match self {
            Self::Upscale => 90,
            _ => 85,
        }
    }

    /// Badge shown next to the enhanced half of the comparison.
    pub fn result_label(&self) -> &'static str {
        match self {
            Self::Colorize => "COLORIZED",
            Self::Upscale => "UPSCALED 4K",
            Self::Beauty => "BEAUTY AI",
            Self::Custom => "CUSTOM AI",
        }
    }

    /// Headline shown while this operation is in flight.
    pub fn processing_title(&self) -> &'static str {
        match self {
            Self::Colorize => "Adding Magic...",
            Self::Upscale => "Enhancing Details...",
            Self::Beauty => "Retouching Face...",
            Self::Custom => "Applying Custom Magic...",
        }
    }

    /// Longer status line shown under the headline.
    pub fn processing_description(&self, instruction: &str) -> String {
        match self {
            Self::Colorize => "Analyzing the image and generating realistic colors. \
                 This may take a few seconds."
                .to_string(),
            Self::Upscale => "Upscaling resolution and removing blur. \
                 Please wait while we sharpen your image."
                .to_string(),
            Self::Beauty => "Smoothing skin and enhancing facial features for a natural glow."
                .to_string(),
            Self::Custom => format!("Generating image based on: \"{}\"", instruction.trim()),
        }
    }
}

impl FromStr for OperationKind {
    type Err = ReviveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "colorize" => Ok(Self::Colorize),
            "upscale" => Ok(Self::Upscale),
            "beauty" => Ok(Self::Beauty),
            "custom" => Ok(Self::Custom),
            other => Err(ReviveError::Validation(ValidationError::UnknownOperation(
                other.to_string(),
            ))),
        }
    }
}

/// A user-provided file as the upload intake hands it over: raw bytes plus
/// the media type the picker declared for them.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Encoded image bytes together with their declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }

    /// Renders as a self-describing `data:` URI, the form the front end
    /// feeds straight into an `<img>` element.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            BASE64_STANDARD.encode(&self.bytes)
        )
    }

    /// Parses a `data:<media-type>;base64,<payload>` URI back into bytes.
    pub fn from_data_uri(uri: &str) -> Result<Self, TranscodeError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| TranscodeError::decode("not a data URI"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| TranscodeError::decode("data URI has no payload"))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| TranscodeError::decode("data URI is not base64-encoded"))?;
        let bytes = BASE64_STANDARD
            .decode(payload)
            .map_err(|e| TranscodeError::decode(format!("invalid base64 payload: {e}")))?;
        Ok(Self::new(bytes, media_type))
    }
}

/// The before/after pair backing the comparison screen.
#[derive(Debug, Clone)]
pub struct EnhancedPair {
    /// Path of the transient preview file holding the user's original
    pub original_path: std::path::PathBuf,
    /// The model's output
    pub enhanced: EncodedImage,
}
