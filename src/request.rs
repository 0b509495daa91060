//! Builds the outbound payload for each provider from one generation request.

use std::path::{Path, PathBuf};

use base64::Engine;
use serde::Serialize;

use crate::error::Result;
use crate::prompt::{
    DECLARED_MIME_TYPE, TASK_ASPECT_RATIO, TASK_MODEL, TASK_PROCESS_MODE,
    TASK_SKIP_PROMPT_CHECK, TASK_TYPE,
};

/// An auxiliary image steering the output, e.g. a brand logo.
#[derive(Clone, Debug)]
pub struct ReferenceImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ReferenceImage {
    /// Reads a bundled asset from disk. The declared mime type is always PNG.
    pub async fn load(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        Ok(Self {
            mime_type: DECLARED_MIME_TYPE.to_string(),
            data,
        })
    }
}

/// Everything one generation needs. Built once per form submission and not persisted.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image_path: PathBuf,
    pub image: Vec<u8>,
    pub references: Vec<ReferenceImage>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, image_path: PathBuf, image: Vec<u8>) -> Self {
        Self {
            prompt: prompt.into(),
            image_path,
            image,
            references: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: ReferenceImage) -> Self {
        self.references.push(reference);
        self
    }
}

// Gemini generateContent body
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    pub(crate) contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GeminiContent {
    pub(crate) role: &'static str,
    pub(crate) parts: Vec<GeminiRequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum GeminiRequestPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiInlineData {
    pub(crate) mime_type: String,
    pub(crate) data: String,
}

impl GeminiInlineData {
    fn png(bytes: &[u8]) -> Self {
        Self {
            mime_type: DECLARED_MIME_TYPE.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }
}

/// Prompt text, then the user photo, then each reference image, all declared as PNG.
pub fn build_gemini_request(request: &GenerationRequest) -> GeminiRequest {
    let mut parts = Vec::with_capacity(2 + request.references.len());
    parts.push(GeminiRequestPart::Text {
        text: request.prompt.clone(),
    });
    parts.push(GeminiRequestPart::InlineData {
        inline_data: GeminiInlineData::png(&request.image),
    });
    for reference in &request.references {
        parts.push(GeminiRequestPart::InlineData {
            inline_data: GeminiInlineData::png(&reference.data),
        });
    }

    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts,
        }],
    }
}

// Task creation body
#[derive(Debug, Serialize)]
pub struct TaskRequest {
    pub(crate) model: &'static str,
    pub(crate) task_type: &'static str,
    pub(crate) input: TaskInput,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskInput {
    pub(crate) prompt: String,
    pub(crate) aspect_ratio: &'static str,
    pub(crate) process_mode: &'static str,
    pub(crate) skip_prompt_check: bool,
    pub(crate) image_urls: Vec<String>,
}

/// Prompt plus fixed aspect ratio, mode and prompt-check flag; the photo is referenced by its local path.
pub fn build_task_request(request: &GenerationRequest) -> TaskRequest {
    TaskRequest {
        model: TASK_MODEL,
        task_type: TASK_TYPE,
        input: TaskInput {
            prompt: request.prompt.clone(),
            aspect_ratio: TASK_ASPECT_RATIO,
            process_mode: TASK_PROCESS_MODE,
            skip_prompt_check: TASK_SKIP_PROMPT_CHECK,
            image_urls: vec![request.image_path.to_string_lossy().into_owned()],
        },
    }
}
