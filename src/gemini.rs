//! Synchronous multimodal generation through Gemini `generateContent`.

use base64::Engine;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{GenerationError, Result};
use crate::prompt::GEMINI_MODEL;
use crate::request::{GenerationRequest, build_gemini_request};

pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One fragment of the model's answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
    Other,
}

/// Parts of the first candidate, in the order the model returned them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratedContent {
    pub parts: Vec<ContentPart>,
}

impl GeneratedContent {
    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, ContentPart::InlineData { .. }))
            .count()
    }
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: GEMINI_MODEL.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends the whole request in one call. Any non-2xx status or unreadable body is an error;
    /// nothing is retried.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = build_gemini_request(request);
        info!(
            "calling {} with {} reference image(s)",
            self.model,
            request.references.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: GeminiResponse = response.json().await?;
        let content = payload.into_content()?;
        debug!(
            "{} returned {} part(s), {} image(s)",
            self.model,
            content.parts.len(),
            content.image_count()
        );
        Ok(content)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    data: String,
}

impl GeminiResponse {
    fn into_content(self) -> Result<GeneratedContent> {
        let Some(content) = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
        else {
            return Ok(GeneratedContent::default());
        };

        let mut parts = Vec::with_capacity(content.parts.len());
        for part in content.parts {
            let converted = match (part.inline_data, part.text) {
                (Some(inline), _) => {
                    let data = base64::engine::general_purpose::STANDARD
                        .decode(inline.data.as_bytes())
                        .map_err(|e| GenerationError::Decode(e.to_string()))?;
                    ContentPart::InlineData {
                        mime_type: inline.mime_type,
                        data,
                    }
                }
                (None, Some(text)) => ContentPart::Text(text),
                (None, None) => ContentPart::Other,
            };
            parts.push(converted);
        }
        Ok(GeneratedContent { parts })
    }
}
