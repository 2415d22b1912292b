use crate::error::Error;
use crate::gemini::GeminiGenerationConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: String,
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// socks or http proxy, example: socks5://192.168.0.2:10080
    pub proxy: Option<String>,
    pub timeout_secs: Option<u64>,
    pub generation: GenerationSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
    pub stop_sequences: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            proxy: None,
            timeout_secs: None,
            generation: GenerationSettings::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read config file {}: {}", path, e)))?;
        Self::from_yaml(&content)
            .map_err(|e| Error::Config(format!("invalid config file {}: {}", path, e)))
    }

    fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not to a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Looks the key up through `lookup`, normally `std::env::var`.
    /// An empty value counts as absent.
    pub fn resolve_api_key<F>(&self, lookup: F) -> Result<String, Error>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        match lookup(&self.api_key_env) {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::Config(format!(
                "environment variable {} is not set",
                self.api_key_env
            ))),
        }
    }

    pub fn generation_config(&self) -> GeminiGenerationConfig {
        let g = &self.generation;
        GeminiGenerationConfig {
            temperature: g.temperature,
            top_p: g.top_p,
            top_k: g.top_k,
            max_output_tokens: g.max_output_tokens,
            stop_sequences: g.stop_sequences.clone(),
        }
    }
}
