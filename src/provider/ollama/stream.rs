//! Decodes the NDJSON chat stream into unified events.

use serde_json::Value;
use tracing::warn;

use crate::error::Error;
use crate::http::HttpBodyStream;
use crate::sse::LineScanner;
use crate::stream::{EventSender, StreamReader};
use crate::types::{
    Delta, FinishReason, FunctionCallDelta, StreamEvent, ToolCallDelta, ToolCallKind,
};

use super::response::{encode_arguments, finish_reason};
use super::types::{OllamaMessage, OllamaResponse};

pub(crate) fn spawn_stream(body: HttpBodyStream) -> StreamReader {
    StreamReader::spawn(move |events| run(body, events))
}

async fn run(body: HttpBodyStream, events: EventSender) {
    let mut lines = LineScanner::new(body);
    // Frames carry no tool-call indices, so positions are assigned here and
    // keep counting across frames.
    let mut next_index = 0usize;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.is_empty() {
                    continue;
                }
                let value: Value = match serde_json::from_slice(&line) {
                    Ok(value) => value,
                    Err(_) => continue,
                };
                let frame: OllamaResponse = match serde_json::from_value(value) {
                    Ok(frame) => frame,
                    Err(err) => {
                        warn!(error = %err, "aborting stream on malformed frame");
                        let _ = events
                            .send(Err(Error::provider(
                                "ollama",
                                format!("malformed stream frame: {err}"),
                            )))
                            .await;
                        return;
                    }
                };

                let has_tool_calls = !frame.message.tool_calls.is_empty();
                if let Some(delta) = convert_frame_delta(frame.message, &mut next_index) {
                    if events.send(Ok(StreamEvent::Delta(delta))).await.is_err() {
                        return;
                    }
                }
                if frame.done {
                    let finish = finish_reason(frame.done_reason.as_deref(), has_tool_calls);
                    let _ = events.send(Ok(StreamEvent::Finish(finish))).await;
                    return;
                }
            }
            Ok(None) => return,
            Err(err) => {
                let _ = events.send(Err(err)).await;
                return;
            }
        }
    }
}

fn convert_frame_delta(message: OllamaMessage, next_index: &mut usize) -> Option<Delta> {
    let content = (!message.content.is_empty()).then_some(message.content);
    let mut tool_calls = Vec::new();
    for call in message.tool_calls {
        let index = *next_index;
        *next_index += 1;
        tool_calls.push(ToolCallDelta {
            index,
            id: Some(format!("call_{index}")),
            kind: Some(ToolCallKind::Function),
            function: FunctionCallDelta {
                name: Some(call.function.name),
                arguments: Some(encode_arguments(call.function.arguments)),
            },
        });
    }
    if content.is_none() && tool_calls.is_empty() {
        return None;
    }
    Some(Delta {
        content,
        tool_calls,
    })
}
