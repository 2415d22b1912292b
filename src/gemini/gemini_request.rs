use crate::gemini::{GeminiContent, GeminiGenerationConfig};
use serde::{Deserialize, Serialize};

/// Shared body of `generateContent` and `streamGenerateContent`; the model
/// is part of the URL path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiGenerationConfig>,
}

impl GeminiRequest {
    pub fn new(contents: Vec<GeminiContent>, generation_config: &GeminiGenerationConfig) -> Self {
        let generation_config = if generation_config.is_empty() {
            None
        } else {
            Some(generation_config.clone())
        };
        Self {
            contents,
            generation_config,
        }
    }
}
