//! Client for the remote generative image model.
//!
//! The engine talks to the model through the [`EnhanceClient`] trait so the
//! dispatcher can be exercised with a mock; [`GeminiClient`] is the
//! production implementation, a single `generateContent` round trip with
//! the image attached as inline base64 data.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::EncodedImage;
use crate::utils::GatewayError;

const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Generative edits can take a while on large inputs; generous but bounded.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Performs one enhancement: image in, directive applied, image out.
#[async_trait]
pub trait EnhanceClient: Send + Sync {
    async fn enhance(
        &self,
        image: &EncodedImage,
        directive: &str,
    ) -> Result<EncodedImage, GatewayError>;
}

/// Client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Creates a client with the provided API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Reads the API key from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self, GatewayError> {
        match env::var("GEMINI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(GatewayError::MissingApiKey),
        }
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn send_request(
        &self,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GatewayError> {
        let url = format!(
            "{BASE_URL}/{model}:generateContent?key={api_key}",
            model = self.model,
            api_key = self.api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| GatewayError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|err| GatewayError::ResponseParsing(err.to_string()))
    }
}

#[async_trait]
impl EnhanceClient for GeminiClient {
    async fn enhance(
        &self,
        image: &EncodedImage,
        directive: &str,
    ) -> Result<EncodedImage, GatewayError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.media_type.clone(),
                            data: BASE64_STANDARD.encode(&image.bytes),
                        },
                    },
                    Part::Text {
                        text: directive.to_string(),
                    },
                ],
            }],
        };

        debug!(
            "Sending enhancement request ({} bytes, model {})",
            image.bytes.len(),
            self.model
        );
        let response = self.send_request(&request).await?;
        extract_image(response)
    }
}

/// Pulls the first image-bearing part of the first candidate out of a
/// `generateContent` response.
fn extract_image(response: GenerateContentResponse) -> Result<EncodedImage, GatewayError> {
    let parts = response
        .candidates
        .and_then(|mut candidates| {
            if candidates.is_empty() {
                None
            } else {
                candidates.swap_remove(0).content
            }
        })
        .and_then(|content| content.parts)
        .ok_or(GatewayError::NoContent)?;

    for part in parts {
        if let Some(inline) = part.inline_data {
            let bytes = BASE64_STANDARD
                .decode(inline.data.as_bytes())
                .map_err(|e| GatewayError::ResponseParsing(format!("invalid image data: {e}")))?;
            return Ok(EncodedImage::new(bytes, inline.mime_type));
        }
    }

    Err(GatewayError::NoImage)
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    #[serde(rename = "inlineData", default)]
    inline_data: Option<InlineData>,
    #[serde(default)]
    #[allow(dead_code)]
    text: Option<String>,
}
