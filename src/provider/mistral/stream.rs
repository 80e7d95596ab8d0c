//! Decodes the Mistral SSE stream into unified events.

use serde_json::Value;
use tracing::warn;

use crate::error::Error;
use crate::http::HttpBodyStream;
use crate::sse::{SseDecoder, SseFrame};
use crate::stream::{EventSender, StreamReader};
use crate::types::{
    Delta, FinishReason, FunctionCallDelta, StreamEvent, ToolCallDelta, ToolCallKind,
};

use super::types::{MistralStreamChunk, MistralStreamDelta, MistralStreamToolCall};

pub(crate) fn spawn_stream(body: HttpBodyStream) -> StreamReader {
    StreamReader::spawn(move |events| run(body, events))
}

async fn run(body: HttpBodyStream, events: EventSender) {
    let mut frames = SseDecoder::new(body);
    let mut finish_sent = false;

    loop {
        match frames.next_frame().await {
            Ok(Some(SseFrame::Data(payload))) => {
                let value: Value = match serde_json::from_str(&payload) {
                    Ok(value) => value,
                    Err(_) => continue,
                };
                let chunk: MistralStreamChunk = match serde_json::from_value(value) {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        warn!(error = %err, "aborting stream on malformed chunk");
                        let _ = events
                            .send(Err(Error::provider(
                                "mistral",
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

fn convert_delta(delta: MistralStreamDelta) -> Option<Delta> {
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

fn convert_tool_call(call: MistralStreamToolCall) -> ToolCallDelta {
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

    fn body(chunks: &[&str]) -> HttpBodyStream {
        let owned: Vec<Result<Vec<u8>, Error>> = chunks
            .iter()
            .map(|chunk| Ok(chunk.as_bytes().to_vec()))
            .collect();
        Box::pin(stream::iter(owned))
    }

    #[tokio::test]
    async fn fragments_then_finish() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Bon\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"jour\"},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        assert_eq!(
            reader.recv().await.unwrap(),
            StreamEvent::Delta(Delta::content("Bon"))
        );
        assert_eq!(
            reader.recv().await.unwrap(),
            StreamEvent::Delta(Delta::content("jour"))
        );
        assert_eq!(
            reader.recv().await.unwrap(),
            StreamEvent::Finish(FinishReason::Stop)
        );
        assert!(matches!(reader.recv().await, Err(Error::StreamClosed)));
    }

    #[tokio::test]
    async fn done_without_finish_synthesizes_stop() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        assert_eq!(
            reader.recv().await.unwrap(),
            StreamEvent::Delta(Delta::content("x"))
        );
        assert_eq!(
            reader.recv().await.unwrap(),
            StreamEvent::Finish(FinishReason::Stop)
        );
    }

    #[tokio::test]
    async fn tool_call_fragments_pass_the_vendor_index_through() {
        let mut reader = spawn_stream(body(&[
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":1,\"id\":\"call_b\",\"function\":{\"name\":\"lookup\",\"arguments\":\"{}\"}}]}}]}\n\n",
            "data: [DONE]\n\n",
        ]));

        let StreamEvent::Delta(delta) = reader.recv().await.unwrap() else {
            panic!("expected delta");
        };
        assert_eq!(delta.tool_calls[0].index, 1);
        assert_eq!(delta.tool_calls[0].id.as_deref(), Some("call_b"));
        assert_eq!(delta.tool_calls[0].function.name.as_deref(), Some("lookup"));
    }

    #[tokio::test]
    async fn schema_violation_aborts_the_stream() {
        let mut reader = spawn_stream(body(&["data: {\"choices\":\"oops\"}\n\n"]));

        assert!(matches!(reader.recv().await, Err(Error::Provider { .. })));
        assert!(matches!(reader.recv().await, Err(Error::StreamClosed)));
    }
}
