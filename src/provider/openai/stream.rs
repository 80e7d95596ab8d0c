//! Decodes the Chat Completions SSE stream into unified events.

use serde_json::Value;
use tracing::warn;

use crate::error::Error;
use crate::http::HttpBodyStream;
use crate::sse::{SseDecoder, SseFrame};
use crate::stream::{EventSender, StreamReader};
use crate::types::{
    Delta, FinishReason, FunctionCallDelta, StreamEvent, ToolCallDelta, ToolCallKind,
};

use super::types::{OpenAiStreamChunk, OpenAiStreamDelta, OpenAiStreamToolCall};

pub(crate) fn spawn_stream(body: HttpBodyStream) -> StreamReader {
    StreamReader::spawn(move |events| run(body, events))
}

async fn run(body: HttpBodyStream, events: EventSender) {
    let mut frames = SseDecoder::new(body);
    let mut finish_sent = false;

    loop {
        match frames.next_frame().await {
            Ok(Some(SseFrame::Data(payload))) => {
                // Two-stage decode: non-JSON payloads are framing noise and are
                // skipped; valid JSON that violates the chunk schema aborts.
                let value: Value = match serde_json::from_str(&payload) {
                    Ok(value) => value,
                    Err(_) => continue,
                };
                let chunk: OpenAiStreamChunk = match serde_json::from_value(value) {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        warn!(error = %err, "aborting stream on malformed chunk");
                        let _ = events
                            .send(Err(Error::provider(
                                "openai",
                                format!("malformed stream chunk: {err}"),
                            )))
                            .await;
                        return;
                    }
                };

                let Some(choice) = chunk.choices.into_iter().next() else {
                    continue;
                };
                if let Some(delta) = convert_delta(choice.delta) {
                    if events.send(Ok(StreamEvent::Delta(delta))).await.is_err() {
                        return;
                    }
                }
                if let Some(reason) = choice.finish_reason {
                    if !finish_sent {
                        finish_sent = true;
                        let finish = StreamEvent::Finish(FinishReason::from(reason.as_str()));
                        if events.send(Ok(finish)).await.is_err() {
                            return;
                        }
                    }
                }
            }
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

fn convert_delta(delta: OpenAiStreamDelta) -> Option<Delta> {
    let content = delta.content.filter(|text| !text.is_empty());
    let tool_calls: Vec<ToolCallDelta> = delta
        .tool_calls
        .into_iter()
        .map(convert_tool_call)
        .collect();
    if content.is_none() && tool_calls.is_empty() {
        return None;
    }
    Some(Delta {
        content,
        tool_calls,
    })
}

fn convert_tool_call(call: OpenAiStreamToolCall) -> ToolCallDelta {
    ToolCallDelta {
        index: call.index,
        id: call.id,
        kind: call.kind.as_deref().map(ToolCallKind::from),
        function: FunctionCallDelta {
            name: call.function.name,
            arguments: call.function.arguments,
        },
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;
    use crate::stream::StreamReader;

    fn body(chunks: &[&str]) -> HttpBodyStream {
        let owned: Vec<Result<Vec<u8>, Error>> = chunks
            .iter()
            .map(|chunk| Ok(chunk.as_bytes().to_vec()))
            .collect();
        Box::pin(stream::iter(owned))
    }

    async fn drain(reader: &mut StreamReader) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        loop {
            match reader.recv().await {
                Ok(event) => events.push(event),
                Err(Error::StreamClosed) => break,
                Err(err) => panic!("unexpected stream error: {err}"),
            }
        }
        events
    }

    #[tokio::test]
    async fn content_fragments_then_finish() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        let events = drain(&mut reader).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta(Delta::content("Hel")),
                StreamEvent::Delta(Delta::content("lo")),
                StreamEvent::Finish(FinishReason::Stop),
            ]
        );

        // The closed outcome is sticky.
        assert!(matches!(reader.recv().await, Err(Error::StreamClosed)));
        assert!(matches!(reader.recv().await, Err(Error::StreamClosed)));
    }

    #[tokio::test]
    async fn chunk_with_content_and_finish_splits_into_two_events() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"done\"},\"finish_reason\":\"length\"}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        let events = drain(&mut reader).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta(Delta::content("done")),
                StreamEvent::Finish(FinishReason::Length),
            ]
        );
    }

    #[tokio::test]
    async fn done_without_finish_reason_synthesizes_stop() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        let events = drain(&mut reader).await;
        assert_eq!(events.last(), Some(&StreamEvent::Finish(FinishReason::Stop)));
    }

    #[tokio::test]
    async fn finish_reason_is_emitted_once() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        let events = drain(&mut reader).await;
        let finishes = events
            .iter()
            .filter(|event| matches!(event, StreamEvent::Finish(_)))
            .count();
        assert_eq!(finishes, 1);
    }

    #[tokio::test]
    async fn tool_call_fragments_keep_the_vendor_index() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_x\",\"type\":\"function\",\"function\":{\"name\":\"lookup\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"q\\\":\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"x\\\"}\"}}]}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        let events = drain(&mut reader).await;
        assert_eq!(events.len(), 4);

        let mut arguments = String::new();
        for event in &events[..3] {
            let StreamEvent::Delta(delta) = event else {
                panic!("expected delta, got {event:?}");
            };
            assert_eq!(delta.tool_calls.len(), 1);
            assert_eq!(delta.tool_calls[0].index, 0);
            if let Some(fragment) = &delta.tool_calls[0].function.arguments {
                arguments.push_str(fragment);
            }
        }
        assert_eq!(arguments, "{\"q\":\"x\"}");
        assert_eq!(
            events[0],
            StreamEvent::Delta(Delta::tool_call(ToolCallDelta {
                index: 0,
                id: Some("call_x".to_string()),
                kind: Some(ToolCallKind::Function),
                function: FunctionCallDelta {
                    name: Some("lookup".to_string()),
                    arguments: None,
                },
            }))
        );
        assert_eq!(events[3], StreamEvent::Finish(FinishReason::ToolCalls));
    }

    #[tokio::test]
    async fn role_priming_and_empty_chunks_emit_nothing() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            "data: {\"choices\":[]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        let events = drain(&mut reader).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta(Delta::content("ok")),
                StreamEvent::Finish(FinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn non_json_payloads_are_skipped() {
        let mut reader = spawn_stream(body(&[
            "data: not-json\n\n",
            ": keep-alive comment\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        let events = drain(&mut reader).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta(Delta::content("ok")),
                StreamEvent::Finish(FinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn schema_violation_aborts_with_one_error() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\n",
            "data: {\"choices\":42}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n\n",
        ]));

        assert_eq!(
            reader.recv().await.unwrap(),
            StreamEvent::Delta(Delta::content("hi"))
        );
        assert!(matches!(reader.recv().await, Err(Error::Provider { .. })));
        assert!(matches!(reader.recv().await, Err(Error::StreamClosed)));
    }

    #[tokio::test]
    async fn frames_split_across_transport_chunks_reassemble() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"con",
            "tent\":\"Hello\"}}]}\n\ndata: [DO",
            "NE]\n\n",
        ]));

        let events = drain(&mut reader).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta(Delta::content("Hello")),
                StreamEvent::Finish(FinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn transport_end_without_done_is_an_ordinary_end() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n",
        ]));

        let events = drain(&mut reader).await;
        // No finish reason is invented for a stream that just stops.
        assert_eq!(events, vec![StreamEvent::Delta(Delta::content("partial"))]);
    }
}
