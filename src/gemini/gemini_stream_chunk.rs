use crate::error::ProviderError;
use crate::gemini::{GeminiCandidate, GeminiErrorResponse, GeminiResponse, GeminiUsage};
use serde::{Deserialize, Serialize};

/// One `data:` frame of `streamGenerateContent?alt=sse`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiStreamChunk {
    // The closing frame may carry only usage metadata
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<GeminiUsage>,
    #[serde(rename = "modelVersion")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(rename = "responseId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl GeminiStreamChunk {
    /// Decodes a frame payload. The API reports mid-stream failures as an
    /// error object in place of a chunk.
    pub fn parse(data: &str) -> Result<Self, ProviderError> {
        let value: serde_json::Value = serde_json::from_str(data)
            .map_err(|e| ProviderError::Stream(format!("JSON parse error: {}", e)))?;
        if value.get("error").is_some() {
            let err: GeminiErrorResponse = serde_json::from_value(value)
                .map_err(|e| ProviderError::Stream(format!("malformed error frame: {}", e)))?;
            return Err(ProviderError::Status {
                status: err.error.code,
                message: err.describe(),
            });
        }
        let response: GeminiResponse = serde_json::from_value(value)
            .map_err(|e| ProviderError::Stream(format!("unexpected chunk shape: {}", e)))?;
        let response = response.into_checked()?;
        Ok(Self {
            candidates: response.candidates,
            usage_metadata: response.usage_metadata,
            model_version: response.model_version,
            response_id: response.response_id,
        })
    }
}
