use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiInlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Base64 payload, as it travels on the wire.
    pub data: String,
}

impl GeminiInlineData {
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Decoded payload length; falls back to the encoded length if the
    /// provider sent something that is not valid base64.
    pub fn byte_len(&self) -> usize {
        STANDARD
            .decode(self.data.as_bytes())
            .map(|b| b.len())
            .unwrap_or(self.data.len())
    }
}
