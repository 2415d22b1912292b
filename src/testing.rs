// Stub provider shared by unit tests.

use crate::error::ProviderError;
use crate::gemini::{GeminiCandidate, GeminiContent, GeminiPart, GeminiResponse, GeminiStreamChunk};
use crate::provider::{ChunkStream, Provider};
use async_trait::async_trait;
use futures::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

pub fn candidate(texts: &[&str]) -> GeminiCandidate {
    GeminiCandidate {
        content: GeminiContent::model(texts.iter().map(|t| GeminiPart::text(*t)).collect()),
        ..Default::default()
    }
}

pub fn response(candidates: Vec<GeminiCandidate>) -> GeminiResponse {
    GeminiResponse {
        candidates,
        ..Default::default()
    }
}

pub fn chunk(text: &str) -> GeminiStreamChunk {
    GeminiStreamChunk {
        candidates: vec![candidate(&[text])],
        ..Default::default()
    }
}

/// Counters a test keeps after the stub has been moved into a dispatcher.
#[derive(Debug, Default)]
pub struct StubRecorder {
    pub calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
    /// Polls of a stream after it already returned `None`.
    pub polls_after_end: AtomicUsize,
    pub dropped: AtomicBool,
    pub recorded: Mutex<Vec<Vec<GeminiContent>>>,
}

impl StubRecorder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn polls_after_end(&self) -> usize {
        self.polls_after_end.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<Vec<GeminiContent>> {
        self.recorded.lock().unwrap().clone()
    }
}

/// Returns queued responses (FIFO) and stream items.
pub struct StubProvider {
    responses: Mutex<VecDeque<Result<GeminiResponse, ProviderError>>>,
    stream_items: Mutex<Option<Vec<Result<GeminiStreamChunk, ProviderError>>>>,
    stream_open_error: Mutex<Option<ProviderError>>,
    recorder: Arc<StubRecorder>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            stream_items: Mutex::new(None),
            stream_open_error: Mutex::new(None),
            recorder: Arc::new(StubRecorder::default()),
        }
    }

    pub fn with_response(self, response: GeminiResponse) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn with_error(self, error: ProviderError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_stream(self, items: Vec<Result<GeminiStreamChunk, ProviderError>>) -> Self {
        *self.stream_items.lock().unwrap() = Some(items);
        self
    }

    /// Makes the next `generate_content_stream` call fail before any chunk.
    pub fn with_stream_error(self, error: ProviderError) -> Self {
        *self.stream_open_error.lock().unwrap() = Some(error);
        self
    }

    pub fn recorder(&self) -> Arc<StubRecorder> {
        self.recorder.clone()
    }
}

impl Drop for StubProvider {
    fn drop(&mut self) {
        self.recorder.dropped.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for StubProvider {
    async fn generate_content(
        &self,
        contents: Vec<GeminiContent>,
    ) -> Result<GeminiResponse, ProviderError> {
        self.recorder.calls.fetch_add(1, Ordering::SeqCst);
        self.recorder.recorded.lock().unwrap().push(contents);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Decode("no stub response queued".into())))
    }

    async fn generate_content_stream(
        &self,
        contents: Vec<GeminiContent>,
    ) -> Result<ChunkStream, ProviderError> {
        self.recorder.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.recorder.recorded.lock().unwrap().push(contents);
        if let Some(error) = self.stream_open_error.lock().unwrap().take() {
            return Err(error);
        }
        let items = self.stream_items.lock().unwrap().take().unwrap_or_default();
        Ok(Box::pin(RecordingStream {
            items: items.into(),
            ended: false,
            recorder: self.recorder.clone(),
        }))
    }
}

struct RecordingStream {
    items: VecDeque<Result<GeminiStreamChunk, ProviderError>>,
    ended: bool,
    recorder: Arc<StubRecorder>,
}

impl Stream for RecordingStream {
    type Item = Result<GeminiStreamChunk, ProviderError>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.ended {
            self.recorder.polls_after_end.fetch_add(1, Ordering::SeqCst);
            return Poll::Ready(None);
        }
        match self.items.pop_front() {
            Some(item) => Poll::Ready(Some(item)),
            None => {
                self.ended = true;
                Poll::Ready(None)
            }
        }
    }
}
