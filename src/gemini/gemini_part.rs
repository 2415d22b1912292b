use crate::gemini::{GeminiFunctionCall, GeminiInlineData};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeminiPart {
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
    /// Part kinds this client does not model (code execution, file data, ...).
    Other(Value),
}

impl GeminiPart {
    pub fn text(text: impl Into<String>) -> Self {
        GeminiPart::Text { text: text.into(), thought: None }
    }
}

/// How a part is relayed to the output sink.
impl fmt::Display for GeminiPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeminiPart::Text { text, .. } => f.write_str(text),
            GeminiPart::InlineData { inline_data } => {
                write!(f, "[{} {} bytes]", inline_data.mime_type, inline_data.byte_len())
            }
            GeminiPart::FunctionCall { function_call } => {
                write!(f, "{}({})", function_call.name, function_call.args)
            }
            GeminiPart::Other(value) => write!(f, "[unsupported part: {}]", value),
        }
    }
}
