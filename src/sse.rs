use crate::error::ProviderError;
use tracing::debug;

/// Incremental decoder for `text/event-stream` bodies.
///
/// Bytes are fed in as they arrive from the network. Each complete event
/// yields its `data` payload, with multi-line data joined by `\n`. Other
/// fields (`event:`, `id:`, `retry:`) and comments are ignored.
#[derive(Debug, Default)]
pub struct SseDecoder {
    // Bytes after the last '\n'; may end inside a multi-byte character
    pending_bytes: Vec<u8>,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns every event it completed.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, ProviderError> {
        self.pending_bytes.extend_from_slice(bytes);
        let mut out = Vec::new();

        while let Some(pos) = self.pending_bytes.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending_bytes.drain(..=pos).collect();
            let line = std::str::from_utf8(&line[..pos])
                .map_err(|e| ProviderError::Stream(format!("invalid UTF-8 in stream: {}", e)))?;
            let line = line.strip_suffix('\r').unwrap_or(line);
            debug!("raw streaming line: {:?}", line);

            if let Some(event) = self.handle_line(line) {
                out.push(event);
            }
        }
        Ok(out)
    }

    /// Flushes whatever the body left unterminated once it has ended.
    pub fn finish(&mut self) -> Result<Option<String>, ProviderError> {
        if !self.pending_bytes.is_empty() {
            let rest = std::mem::take(&mut self.pending_bytes);
            let line = String::from_utf8(rest)
                .map_err(|e| ProviderError::Stream(format!("invalid UTF-8 in stream: {}", e)))?;
            let line = line.strip_suffix('\r').unwrap_or(line.as_str()).to_string();
            if let Some(event) = self.handle_line(&line) {
                return Ok(Some(event));
            }
        }
        Ok(self.take_event())
    }

    fn handle_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.take_event();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data_lines.push(value.to_string());
        }
        None
    }

    fn take_event(&mut self) -> Option<String> {
        if self.data_lines.is_empty() {
            return None;
        }
        let data = self.data_lines.join("\n");
        self.data_lines.clear();
        Some(data)
    }
}
