//! Decodes the Messages SSE stream into unified events.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::error::Error;
use crate::http::HttpBodyStream;
use crate::sse::{SseDecoder, SseFrame};
use crate::stream::{EventSender, StreamReader};
use crate::types::{
    Delta, FinishReason, FunctionCallDelta, StreamEvent, ToolCallDelta, ToolCallKind,
};

use super::response::normalize_stop_reason;
use super::types::{AnthropicStreamBlock, AnthropicStreamDelta, AnthropicStreamEvent};

/// Assigns stable unified indices to tool calls that the wire identifies only
/// by content-block slot.
///
/// Slots are not zero-based from the consumer's point of view: a text block
/// usually occupies slot 0, so the first tool call tends to arrive in slot 1.
/// Indices are handed out in first-seen order and never reused within one
/// stream, so every fragment of one call carries the same index.
#[derive(Debug, Default)]
struct ToolCallSlots {
    assigned: HashMap<u64, usize>,
    next: usize,
}

impl ToolCallSlots {
    fn resolve(&mut self, slot: u64) -> usize {
        if let Some(index) = self.assigned.get(&slot) {
            return *index;
        }
        let index = self.next;
        self.next += 1;
        self.assigned.insert(slot, index);
        index
    }
}

pub(crate) fn spawn_stream(body: HttpBodyStream) -> StreamReader {
    StreamReader::spawn(move |events| run(body, events))
}

async fn run(body: HttpBodyStream, events: EventSender) {
    let mut frames = SseDecoder::new(body);
    let mut slots = ToolCallSlots::default();
    let mut finish_sent = false;

    loop {
        match frames.next_frame().await {
            Ok(Some(SseFrame::Data(payload))) => {
                let value: Value = match serde_json::from_str(&payload) {
                    Ok(value) => value,
                    Err(_) => continue,
                };
                let event: AnthropicStreamEvent = match serde_json::from_value(value) {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(error = %err, "aborting stream on malformed event");
                        let _ = events
                            .send(Err(Error::provider(
                                "anthropic",
                                format!("malformed stream event: {err}"),
                            )))
                            .await;
                        return;
                    }
                };

                match event {
                    AnthropicStreamEvent::ContentBlockStart {
                        index,
                        content_block,
                    } => {
                        let AnthropicStreamBlock::ToolUse { id, name } = content_block else {
                            continue;
                        };
                        let delta = Delta::tool_call(ToolCallDelta {
                            index: slots.resolve(index),
                            id: Some(id),
                            kind: Some(ToolCallKind::Function),
                            function: FunctionCallDelta {
                                name: Some(name),
                                arguments: None,
                            },
                        });
                        if events.send(Ok(StreamEvent::Delta(delta))).await.is_err() {
                            return;
                        }
                    }
                    AnthropicStreamEvent::ContentBlockDelta { index, delta } => match delta {
                        AnthropicStreamDelta::TextDelta { text } => {
                            if text.is_empty() {
                                continue;
                            }
                            if events
                                .send(Ok(StreamEvent::Delta(Delta::content(text))))
                                .await
                                .is_err()
                            {
                                return;
                            }
                        }
                        AnthropicStreamDelta::InputJsonDelta { partial_json } => {
                            let delta = Delta::tool_call(ToolCallDelta {
                                index: slots.resolve(index),
                                id: None,
                                kind: None,
                                function: FunctionCallDelta {
                                    name: None,
                                    arguments: Some(partial_json),
                                },
                            });
                            if events.send(Ok(StreamEvent::Delta(delta))).await.is_err() {
                                return;
                            }
                        }
                        AnthropicStreamDelta::Ignored => {}
                    },
                    AnthropicStreamEvent::MessageDelta { delta } => {
                        let Some(reason) =
                            delta.stop_reason.filter(|reason| !reason.is_empty())
                        else {
                            continue;
                        };
                        if !finish_sent {
                            finish_sent = true;
                            let finish = StreamEvent::Finish(normalize_stop_reason(&reason));
                            if events.send(Ok(finish)).await.is_err() {
                                return;
                            }
                        }
                    }
                    AnthropicStreamEvent::MessageStop => {
                        if !finish_sent {
                            let _ = events
                                .send(Ok(StreamEvent::Finish(FinishReason::Stop)))
                                .await;
                        }
                        return;
                    }
                    AnthropicStreamEvent::Ignored => {}
                }
            }
            // Messages streams end with message_stop; a stray sentinel gets
            // the same treatment.
            Ok(Some(SseFrame::Done)) => {
                if !finish_sent {
                    let _ = events.send(Ok(StreamEvent::Finish(FinishReason::Stop))).await;
                }
                return;
            }
            Ok(None) => return,
            Err(err) => {
                let _ = events.send(Err(err)).await;
                return;
            }
        }
    }
}
