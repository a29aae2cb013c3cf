//! Error types for the enhancement engine.
//!
//! Provides a hierarchy of error types using `thiserror` for ergonomic error handling.

use std::io;
use serde::Serialize;
use thiserror::Error;

/// Validation errors raised at the command boundary.
///
/// These are handled where they occur (upload intake, custom-prompt submit)
/// and never travel through the async completion path.
#[derive(Error, Debug, Serialize)]
pub enum ValidationError {
    /// The uploaded payload does not declare an image media type
    #[error("Not an image: {0}")]
    NotAnImage(String),
    /// The custom operation was submitted without an instruction
    #[error("Please enter a prompt")]
    MissingPrompt,
    /// The requested operation name is not one of the supported kinds
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),
}

/// Errors from decoding or re-encoding image data.
#[derive(Error, Debug, Serialize)]
pub enum TranscodeError {
    /// Input bytes could not be interpreted as an image
    #[error("Failed to decode image: {0}")]
    Decode(String),
    /// Re-encoding the resized image failed
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Errors talking to the remote generative model.
#[derive(Error, Debug, Serialize)]
pub enum GatewayError {
    /// The API credential is not configured
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    /// Transport-level failure (connect, timeout, TLS)
    #[error("Request failed: {0}")]
    Request(String),
    /// The API answered with a non-success status
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },
    /// The response body could not be parsed
    #[error("Failed to parse response: {0}")]
    ResponseParsing(String),
    /// The response carried no candidates
    #[error("No content generated")]
    NoContent,
    /// A candidate exists but contains no image payload
    #[error("No image generated in response")]
    NoImage,
}

/// Main error type for the enhancement engine.
///
/// All errors are converted to this type before reaching the session
/// dispatcher, which reduces them to a single user-facing message.
#[derive(Error, Debug, Serialize)]
pub enum ReviveError {
    /// Input validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Image transcoding failed
    #[error("Processing error: {0}")]
    Transcode(#[from] TranscodeError),

    /// The enhancement gateway failed
    #[error("Enhancement failed: {0}")]
    Gateway(#[from] GatewayError),

    /// The upscale-for-download path failed
    #[error("Failed to prepare 4K download: {0}")]
    Download(String),

    /// File IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Convenience result type for engine operations.
pub type ReviveResult<T> = Result<T, ReviveError>;

// Helper methods for error creation
impl ReviveError {
    pub fn download<T: Into<String>>(msg: T) -> Self {
        Self::Download(msg.into())
    }

    pub fn io<T: Into<String>>(msg: T) -> Self {
        Self::Io(msg.into())
    }
}

impl TranscodeError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

// Convert std::io::Error to ReviveError
impl From<io::Error> for ReviveError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
