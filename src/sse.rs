//! Shared line framing for vendor streaming transports.
//!
//! All four vendors stream over line-oriented bodies: Anthropic, OpenAI and
//! Mistral use Server-Sent Events (`data:` payload lines), Ollama uses
//! newline-delimited JSON. [`LineScanner`] turns a chunked byte stream into
//! complete lines regardless of where chunk boundaries fall; [`SseDecoder`]
//! keeps only `data:` payloads and recognizes the `[DONE]` sentinel. One line
//! is one frame; anything that is not a data line is framing noise and is
//! dropped without comment.

use crate::error::Error;
use crate::http::HttpBodyStream;

use futures_util::StreamExt;

/// Splits a chunked body stream into lines.
///
/// Handles `\n` and `\r\n` terminators and lines split across chunk
/// boundaries. A trailing unterminated line is flushed once the body ends.
pub(crate) struct LineScanner {
    body: HttpBodyStream,
    buffer: Vec<u8>,
    eof: bool,
}

impl LineScanner {
    pub(crate) fn new(body: HttpBodyStream) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            eof: false,
        }
    }

    /// Returns the next complete line without its terminator, or `None` at
    /// end of input.
    ///
    /// # Errors
    ///
    /// Propagates transport read failures from the underlying body.
    pub(crate) async fn next_line(&mut self) -> Result<Option<Vec<u8>>, Error> {
        loop {
            if let Some(line) = Self::drain_line(&mut self.buffer) {
                return Ok(Some(line));
            }

            if self.eof {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let rest = std::mem::take(&mut self.buffer);
                return Ok(Some(rest));
            }

            match self.body.next().await {
                Some(Ok(bytes)) => self.buffer.extend_from_slice(&bytes),
                Some(Err(err)) => return Err(err),
                None => self.eof = true,
            }
        }
    }

    fn drain_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
        buffer.iter().position(|b| *b == b'\n').map(|pos| {
            let mut line: Vec<u8> = buffer.drain(..=pos).collect();
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            line
        })
    }
}

/// One decoded SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseFrame {
    /// Payload of a `data:` line.
    Data(String),
    /// The literal `[DONE]` sentinel.
    Done,
}

/// Extracts [`SseFrame`]s from a line-oriented body.
pub(crate) struct SseDecoder {
    lines: LineScanner,
    done: bool,
}

impl SseDecoder {
    pub(crate) fn new(body: HttpBodyStream) -> Self {
        Self {
            lines: LineScanner::new(body),
            done: false,
        }
    }

    /// Returns the next data frame, `Done` for the sentinel, or `None` once
    /// the body ends or the sentinel was seen.
    ///
    /// Non-data lines (blank separators, `event:` lines, comments) and
    /// payloads that are not valid UTF-8 are skipped as framing noise.
    ///
    /// # Errors
    ///
    /// Propagates transport read failures from the underlying body.
    pub(crate) async fn next_frame(&mut self) -> Result<Option<SseFrame>, Error> {
        if self.done {
            return Ok(None);
        }

        while let Some(line) = self.lines.next_line().await? {
            let Some(payload) = Self::data_payload(&line) else {
                continue;
            };
            let Ok(data) = String::from_utf8(payload) else {
                continue;
            };

            if data.trim() == "[DONE]" {
                self.done = true;
                return Ok(Some(SseFrame::Done));
            }
            return Ok(Some(SseFrame::Data(data)));
        }

        Ok(None)
    }

    fn data_payload(line: &[u8]) -> Option<Vec<u8>> {
        let rest = line.strip_prefix(b"data:")?;
        let rest = rest.strip_prefix(b" ").unwrap_or(rest);
        Some(rest.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;

    fn build_body(chunks: Vec<Result<Vec<u8>, Error>>) -> HttpBodyStream {
        Box::pin(stream::iter(chunks))
    }

    #[tokio::test]
    async fn scanner_reassembles_lines_across_chunk_boundaries() {
        let chunks = vec![
            Ok(b"first ".to_vec()),
            Ok(b"half\nsec".to_vec()),
            Ok(b"ond\n".to_vec()),
        ];
        let mut scanner = LineScanner::new(build_body(chunks));

        assert_eq!(scanner.next_line().await.unwrap(), Some(b"first half".to_vec()));
        assert_eq!(scanner.next_line().await.unwrap(), Some(b"second".to_vec()));
        assert_eq!(scanner.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn scanner_strips_carriage_returns_and_flushes_trailing_line() {
        let chunks = vec![Ok(b"crlf line\r\nno terminator".to_vec())];
        let mut scanner = LineScanner::new(build_body(chunks));

        assert_eq!(scanner.next_line().await.unwrap(), Some(b"crlf line".to_vec()));
        assert_eq!(
            scanner.next_line().await.unwrap(),
            Some(b"no terminator".to_vec())
        );
        assert_eq!(scanner.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn decoder_emits_data_frames_and_done() {
        let chunks = vec![
            Ok(b"data: {\"text\":\"hi\"}\n\n".to_vec()),
            Ok(b"data: [DONE]\n\n".to_vec()),
        ];
        let mut decoder = SseDecoder::new(build_body(chunks));

        assert_eq!(
            decoder.next_frame().await.unwrap(),
            Some(SseFrame::Data("{\"text\":\"hi\"}".to_string()))
        );
        assert_eq!(decoder.next_frame().await.unwrap(), Some(SseFrame::Done));
        assert_eq!(decoder.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn decoder_ignores_non_data_lines() {
        let chunks = vec![Ok(
            b"event: message_start\n: keep-alive\n\ndata:{\"a\":1}\n".to_vec()
        )];
        let mut decoder = SseDecoder::new(build_body(chunks));

        // The prefix may appear with or without a space after the colon.
        assert_eq!(
            decoder.next_frame().await.unwrap(),
            Some(SseFrame::Data("{\"a\":1}".to_string()))
        );
        assert_eq!(decoder.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn decoder_skips_invalid_utf8_payloads() {
        let chunks = vec![Ok(b"data: \xff\xfe\ndata: ok\n".to_vec())];
        let mut decoder = SseDecoder::new(build_body(chunks));

        assert_eq!(
            decoder.next_frame().await.unwrap(),
            Some(SseFrame::Data("ok".to_string()))
        );
        assert_eq!(decoder.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn decoder_propagates_transport_failures() {
        let chunks = vec![
            Ok(b"data: ok\n".to_vec()),
            Err(Error::transport("connection reset")),
        ];
        let mut decoder = SseDecoder::new(build_body(chunks));

        assert!(decoder.next_frame().await.unwrap().is_some());
        assert!(matches!(
            decoder.next_frame().await,
            Err(Error::Transport { .. })
        ));
    }
}
