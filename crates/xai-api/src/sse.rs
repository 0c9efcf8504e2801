//! Server-Sent Events framing for chat-completion streams.
//!
//! xAI emits data-only SSE frames: one or more `data:` lines per frame,
//! frames separated by a blank line, stream terminated by the `data: [DONE]`
//! sentinel. The sentinel is passed through as an ordinary payload; the
//! stream layer interprets it.

/// Incremental parser that turns raw text into complete frame payloads.
pub struct SseParser {
    line_buf: String,
    data_lines: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self {
            line_buf: String::new(),
            data_lines: Vec::new(),
        }
    }

    /// Feed a chunk of text and return the data payloads of any frames it
    /// completed. Partial lines and partial frames are buffered.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        let mut frames = Vec::new();

        for ch in chunk.chars() {
            if ch != '\n' {
                self.line_buf.push(ch);
                continue;
            }

            let mut line = std::mem::take(&mut self.line_buf);
            if line.ends_with('\r') {
                line.pop();
            }

            if line.is_empty() {
                // Blank line ends the frame
                if !self.data_lines.is_empty() {
                    frames.push(self.data_lines.join("\n"));
                    self.data_lines.clear();
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                let value = value.strip_prefix(' ').unwrap_or(value);
                self.data_lines.push(value.to_string());
            } else if line.starts_with(':') {
                // Comment line (keep-alive), skip
            }
            // Other fields (event, id, retry) are ignored; xAI sends
            // data-only frames.
        }

        frames
    }
}

impl Default for SseParser {
    fn default() -> Self {
        Self::new()
    }
}
