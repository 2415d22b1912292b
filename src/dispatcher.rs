use crate::error::Error;
use crate::gemini::GeminiCandidate;
use crate::prompt::{ConversationHistory, Part, Prompt};
use crate::provider::Provider;
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// One fully specified request, picked by the caller.
#[derive(Debug, Clone)]
pub enum RequestMode {
    TextOnly {
        prompt: Prompt,
    },
    /// Images are read in order, then `instruction` is appended last.
    TextAndImage {
        image_paths: Vec<PathBuf>,
        instruction: String,
    },
    Chat {
        history: ConversationHistory,
        message: Prompt,
    },
    Streaming {
        prompt: Prompt,
    },
}

impl RequestMode {
    pub fn name(&self) -> &'static str {
        match self {
            RequestMode::TextOnly { .. } => "text",
            RequestMode::TextAndImage { .. } => "image",
            RequestMode::Chat { .. } => "chat",
            RequestMode::Streaming { .. } => "stream",
        }
    }
}

/// Forwards one request to the provider and relays every part of every
/// candidate to `out`, in order.
pub struct RequestDispatcher<P: Provider, W: Write> {
    provider: P,
    out: W,
}

impl<P: Provider, W: Write> RequestDispatcher<P, W> {
    pub fn new(provider: P, out: W) -> Self {
        Self { provider, out }
    }

    /// Consumes the dispatcher, so the provider is released on every
    /// return path. The sink is handed back for inspection.
    pub async fn dispatch(mut self, mode: RequestMode) -> Result<W, Error> {
        info!(mode = mode.name(), "dispatching request");
        match mode {
            RequestMode::TextOnly { prompt } => {
                let resp = self.provider.generate_content(vec![prompt.to_content()]).await?;
                print_candidates(&mut self.out, &resp.candidates)?;
            }
            RequestMode::TextAndImage { image_paths, instruction } => {
                let mut parts = Vec::with_capacity(image_paths.len() + 1);
                for path in &image_paths {
                    parts.push(Part::image_from_file(path)?);
                }
                parts.push(Part::text(instruction));
                let prompt = Prompt::new(parts);
                let resp = self.provider.generate_content(vec![prompt.to_content()]).await?;
                print_candidates(&mut self.out, &resp.candidates)?;
            }
            RequestMode::Chat { history, message } => {
                let mut session = self.provider.start_chat(history);
                let resp = session.send_message(message).await?;
                print_candidates(&mut self.out, &resp.candidates)?;
            }
            RequestMode::Streaming { prompt } => {
                let mut stream = self
                    .provider
                    .generate_content_stream(vec![prompt.to_content()])
                    .await?;
                let mut chunks = 0usize;
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk?;
                    chunks += 1;
                    print_candidates(&mut self.out, &chunk.candidates)?;
                    self.out.flush()?;
                }
                debug!("stream finished after {} chunks", chunks);
            }
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

pub fn print_candidates<W: Write>(out: &mut W, candidates: &[GeminiCandidate]) -> std::io::Result<()> {
    for candidate in candidates {
        if let Some(reason) = candidate.finish_reason {
            debug!("candidate {:?} finished: {:?}", candidate.index, reason);
        }
        for part in &candidate.content.parts {
            writeln!(out, "{}", part)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::gemini::GeminiPart;
    use crate::prompt::Turn;
    use crate::testing::{StubProvider, candidate, chunk, response};
    use std::io::Write as _;

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_text_prints_every_candidate_in_order() {
        let stub = StubProvider::new().with_response(response(vec![
            candidate(&["first"]),
            candidate(&["second", "second-b"]),
            candidate(&["third"]),
        ]));
        let recorder = stub.recorder();

        let out = RequestDispatcher::new(stub, Vec::new())
            .dispatch(RequestMode::TextOnly { prompt: Prompt::text("Who created ONE PIECE?") })
            .await
            .unwrap();

        assert_eq!(output(out), "first\nsecond\nsecond-b\nthird\n");
        assert_eq!(recorder.calls(), 1);
        assert!(recorder.dropped());
        let sent = &recorder.recorded()[0];
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].parts, vec![GeminiPart::text("Who created ONE PIECE?")]);
    }

    #[tokio::test]
    async fn test_image_mode_sends_images_then_instruction() {
        let mut first = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        first.write_all(b"one").unwrap();
        let mut second = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        second.write_all(b"two").unwrap();

        let stub = StubProvider::new().with_response(response(vec![candidate(&["different hats"])]));
        let recorder = stub.recorder();

        let out = RequestDispatcher::new(stub, Vec::new())
            .dispatch(RequestMode::TextAndImage {
                image_paths: vec![first.path().to_path_buf(), second.path().to_path_buf()],
                instruction: "compare".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(output(out), "different hats\n");
        let parts = &recorder.recorded()[0][0].parts;
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].to_string(), "[image/png 3 bytes]");
        assert_eq!(parts[1].to_string(), "[image/png 3 bytes]");
        assert_eq!(parts[2], GeminiPart::text("compare"));
    }

    #[tokio::test]
    async fn test_missing_image_fails_before_any_call() {
        let dir = tempfile::tempdir().unwrap();
        let stub = StubProvider::new().with_response(response(vec![candidate(&["unused"])]));
        let recorder = stub.recorder();

        let result = RequestDispatcher::new(stub, Vec::new())
            .dispatch(RequestMode::TextAndImage {
                image_paths: vec![dir.path().join("onepiece01_luffy.png")],
                instruction: "compare".to_string(),
            })
            .await;

        assert!(matches!(result, Err(Error::Io { .. })));
        assert_eq!(recorder.calls(), 0);
        assert!(recorder.dropped());
    }

    #[tokio::test]
    async fn test_chat_sends_history_verbatim_before_message() {
        let history = ConversationHistory::new(vec![
            Turn::user("Hello, what red fruits are there?"),
            Turn::model("There are strawberries and apples."),
        ]);
        let stub = StubProvider::new().with_response(response(vec![candidate(&["Strawberries."])]));
        let recorder = stub.recorder();

        let out = RequestDispatcher::new(stub, Vec::new())
            .dispatch(RequestMode::Chat {
                history: history.clone(),
                message: Prompt::text("Which of those is smaller?"),
            })
            .await
            .unwrap();

        assert_eq!(output(out), "Strawberries.\n");
        let sent = &recorder.recorded()[0];
        let mut expected = history.to_contents();
        expected.push(Prompt::text("Which of those is smaller?").to_content());
        assert_eq!(sent, &expected);
        let roles: Vec<_> = sent.iter().map(|c| c.role.clone().unwrap()).collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
    }

    #[tokio::test]
    async fn test_streaming_consumes_in_order_and_stops_at_end() {
        let stub = StubProvider::new().with_stream(vec![Ok(chunk("A")), Ok(chunk("B")), Ok(chunk("C"))]);
        let recorder = stub.recorder();

        let out = RequestDispatcher::new(stub, Vec::new())
            .dispatch(RequestMode::Streaming { prompt: Prompt::text("Explain") })
            .await
            .unwrap();

        assert_eq!(output(out), "A\nB\nC\n");
        assert_eq!(recorder.stream_calls(), 1);
        assert_eq!(recorder.polls_after_end(), 0);
    }

    #[tokio::test]
    async fn test_streaming_error_aborts_after_partial_output() {
        let stub = StubProvider::new().with_stream(vec![
            Ok(chunk("A")),
            Err(ProviderError::Stream("connection reset".into())),
            Ok(chunk("never")),
        ]);

        let mut sink = Vec::new();
        let result = RequestDispatcher::new(stub, &mut sink)
            .dispatch(RequestMode::Streaming { prompt: Prompt::text("Explain") })
            .await;

        assert!(matches!(result, Err(Error::Provider(ProviderError::Stream(_)))));
        assert_eq!(output(sink), "A\n");
    }

    #[tokio::test]
    async fn test_provider_error_aborts_with_no_output() {
        let stub = StubProvider::new().with_error(ProviderError::Status {
            status: 403,
            message: "PERMISSION_DENIED".into(),
        });
        let recorder = stub.recorder();

        let mut sink = Vec::new();
        let result = RequestDispatcher::new(stub, &mut sink)
            .dispatch(RequestMode::TextOnly { prompt: Prompt::text("hi") })
            .await;

        assert!(matches!(
            result,
            Err(Error::Provider(ProviderError::Status { status: 403, .. }))
        ));
        assert!(sink.is_empty());
        assert!(recorder.dropped());
    }

    #[tokio::test]
    async fn test_stream_open_error_aborts_with_no_output() {
        let stub = StubProvider::new().with_stream_error(ProviderError::Status {
            status: 429,
            message: "Quota exceeded (RESOURCE_EXHAUSTED)".into(),
        });
        let recorder = stub.recorder();

        let mut sink = Vec::new();
        let result = RequestDispatcher::new(stub, &mut sink)
            .dispatch(RequestMode::Streaming { prompt: Prompt::text("Explain") })
            .await;

        assert!(matches!(
            result,
            Err(Error::Provider(ProviderError::Status { status: 429, .. }))
        ));
        assert!(sink.is_empty());
        assert_eq!(recorder.stream_calls(), 1);
        assert_eq!(recorder.polls_after_end(), 0);
        assert!(recorder.dropped());
    }

    #[tokio::test]
    async fn test_chat_error_aborts_with_no_output() {
        let stub = StubProvider::new().with_error(ProviderError::Stream("connection reset".into()));
        let recorder = stub.recorder();

        let mut sink = Vec::new();
        let result = RequestDispatcher::new(stub, &mut sink)
            .dispatch(RequestMode::Chat {
                history: ConversationHistory::new(vec![Turn::user("hi"), Turn::model("hello")]),
                message: Prompt::text("again?"),
            })
            .await;

        assert!(matches!(result, Err(Error::Provider(ProviderError::Stream(_)))));
        assert!(sink.is_empty());
        assert_eq!(recorder.calls(), 1);
        assert!(recorder.dropped());
    }
}
