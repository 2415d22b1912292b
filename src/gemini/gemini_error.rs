use serde::{Deserialize, Serialize};

/// Body the API returns alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiErrorResponse {
    pub error: GeminiErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiErrorDetail {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    /// Canonical status name, e.g. `PERMISSION_DENIED`.
    #[serde(default)]
    pub status: String,
}

impl GeminiErrorResponse {
    pub fn describe(&self) -> String {
        if self.error.status.is_empty() {
            self.error.message.clone()
        } else {
            format!("{} ({})", self.error.message, self.error.status)
        }
    }
}
