use crate::error::ProviderError;
use crate::gemini::{GeminiContent, GeminiPart, GeminiResponse, GeminiStreamChunk};
use crate::prompt::{ConversationHistory, Part, Prompt, Role, Turn};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use tracing::debug;

/// Lazily pulled chunks; `None` is the end-of-stream signal.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GeminiStreamChunk, ProviderError>> + Send>>;

/// What the dispatcher needs from a generative-content backend.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate_content(
        &self,
        contents: Vec<GeminiContent>,
    ) -> Result<GeminiResponse, ProviderError>;

    async fn generate_content_stream(
        &self,
        contents: Vec<GeminiContent>,
    ) -> Result<ChunkStream, ProviderError>;

    fn start_chat(&self, history: ConversationHistory) -> ChatSession<'_, Self>
    where
        Self: Sized,
    {
        ChatSession::new(self, history)
    }
}

/// A conversation bound to one provider. The history is only what the
/// caller seeded plus turns completed through this session.
pub struct ChatSession<'a, P: Provider> {
    provider: &'a P,
    history: ConversationHistory,
}

impl<'a, P: Provider> ChatSession<'a, P> {
    pub fn new(provider: &'a P, history: ConversationHistory) -> Self {
        Self { provider, history }
    }

    #[cfg(test)]
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Sends the history followed by `message`. On success both the
    /// message and the first candidate's reply join the history.
    pub async fn send_message(&mut self, message: Prompt) -> Result<GeminiResponse, ProviderError> {
        let mut contents = self.history.to_contents();
        contents.push(message.to_content());
        if self.history.is_empty() {
            debug!("sending chat message without history");
        } else {
            debug!("sending chat message with {} prior turns", self.history.len());
        }

        let response = self.provider.generate_content(contents).await?;

        self.history.push(Turn {
            role: Role::User,
            parts: message.parts().to_vec(),
        });
        if let Some(candidate) = response.candidates.first() {
            let parts = candidate
                .content
                .parts
                .iter()
                .filter_map(|p| match p {
                    GeminiPart::Text { text, .. } => Some(Part::text(text.clone())),
                    _ => None,
                })
                .collect();
            self.history.push(Turn { role: Role::Model, parts });
        }
        Ok(response)
    }
}
