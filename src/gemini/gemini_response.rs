use crate::error::ProviderError;
use crate::gemini::{GeminiCandidate, GeminiFinishReason, GeminiPromptFeedback, GeminiUsage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<GeminiUsage>,
    #[serde(rename = "modelVersion")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(rename = "promptFeedback")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(rename = "responseId")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl GeminiResponse {
    /// A response with no candidates and a block reason means the prompt
    /// itself was rejected. A candidate stopped for safety or recitation
    /// is blocked output.
    pub fn into_checked(self) -> Result<Self, ProviderError> {
        if self.candidates.is_empty() {
            if let Some(reason) = self
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason)
            {
                return Err(ProviderError::Blocked(format!("{:?}", reason)));
            }
        }
        for candidate in &self.candidates {
            if let Some(reason @ (GeminiFinishReason::Safety | GeminiFinishReason::Recitation)) =
                candidate.finish_reason
            {
                return Err(ProviderError::Blocked(format!(
                    "candidate {} finished with {:?}",
                    candidate.index.unwrap_or(0),
                    reason
                )));
            }
        }
        Ok(self)
    }
}
