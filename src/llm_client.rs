use crate::config::Config;
use crate::error::{Error, ProviderError};
use crate::gemini::{
    GeminiContent, GeminiErrorResponse, GeminiGenerationConfig, GeminiRequest, GeminiResponse,
    GeminiStreamChunk,
};
use crate::provider::{ChunkStream, Provider};
use crate::sse::SseDecoder;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::HeaderValue;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// HTTP client for the Gemini `generateContent` endpoints.
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    generation_config: GeminiGenerationConfig,
    request_id: Option<String>,
}

impl GeminiClient {
    /// Resolves the API key through `lookup` before anything touches the
    /// network, so a missing key is always a config error.
    pub fn from_config<F>(config: &Config, lookup: F) -> Result<Self, Error>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let api_key = config.resolve_api_key(lookup)?;

        let mut client_builder = reqwest::Client::builder();
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("invalid proxy {}: {}", proxy, e)))?;
            client_builder = client_builder.proxy(proxy);
        }
        if let Some(secs) = config.timeout_secs {
            client_builder = client_builder.timeout(Duration::from_secs(secs));
        }
        let http_client = client_builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_base: config.api_base.clone(),
            api_key,
            model: config.model.clone(),
            generation_config: config.generation_config(),
            request_id: None,
        })
    }

    /// Tags every outgoing request with `x-request-id`.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_target_url(&self, stream: bool) -> String {
        let path = if stream {
            format!("models/{}:streamGenerateContent?alt=sse", self.model)
        } else {
            format!("models/{}:generateContent", self.model)
        };
        if self.api_base.ends_with('/') {
            format!("{}{}", self.api_base, path)
        } else {
            format!("{}/{}", self.api_base, path)
        }
    }

    async fn send(
        &self,
        contents: Vec<GeminiContent>,
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let body = GeminiRequest::new(contents, &self.generation_config);
        let target_url = self.build_target_url(stream);

        let mut target_request = self
            .http_client
            .post(&target_url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key);
        if stream {
            target_request = target_request.header("Accept", "text/event-stream");
        }
        if let Some(id) = &self.request_id {
            if let Ok(val) = HeaderValue::from_str(id) {
                target_request = target_request.header("x-request-id", val);
            }
        }

        info!("Sending request to: {}", target_url);
        debug!(
            "request body: {}",
            serde_json::to_string(&body).unwrap_or_default()
        );
        let response = target_request.json(&body).send().await?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<GeminiErrorResponse>(&text) {
        Ok(err) => err.describe(),
        Err(_) if text.trim().is_empty() => status.canonical_reason().unwrap_or("").to_string(),
        Err(_) => text,
    };
    Err(ProviderError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Provider for GeminiClient {
    async fn generate_content(
        &self,
        contents: Vec<GeminiContent>,
    ) -> Result<GeminiResponse, ProviderError> {
        let response = self.send(contents, false).await?;
        let text = response.text().await?;
        debug!("raw response: {}", text);
        let parsed: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::Decode(format!("failed to parse response: {}", e)))?;
        parsed.into_checked()
    }

    async fn generate_content_stream(
        &self,
        contents: Vec<GeminiContent>,
    ) -> Result<ChunkStream, ProviderError> {
        let response = self.send(contents, true).await?;
        let mut byte_stream = Box::pin(response.bytes_stream());

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(bytes) = byte_stream.next().await {
                let events = match bytes {
                    Ok(bytes) => decoder.push(&bytes),
                    Err(e) => Err(ProviderError::Stream(format!("upstream streaming error: {}", e))),
                };
                match events {
                    Ok(events) => {
                        for data in events {
                            yield GeminiStreamChunk::parse(&data);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
            match decoder.finish() {
                Ok(Some(data)) => yield GeminiStreamChunk::parse(&data),
                Ok(None) => {}
                Err(e) => yield Err(e),
            }
        };
        Ok(Box::pin(stream))
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

impl Drop for GeminiClient {
    fn drop(&mut self) {
        debug!("releasing client for model {}", self.model);
    }
}
