use serde_json::Value;

use crate::types::{
    ChatResponse, Choice, FinishReason, FunctionCall, Message, Role, ToolCall, ToolCallKind, Usage,
};

use super::types::{AnthropicContentBlock, AnthropicResponse, AnthropicUsage};

/// Maps a Messages response body onto the unified shape.
///
/// Text blocks concatenate in order into one assistant message; each
/// `tool_use` block becomes a ToolCall whose `index` is the block's position
/// in the content list. The result always has a single choice at index 0.
pub(crate) fn map_response(response: AnthropicResponse) -> ChatResponse {
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    for (index, block) in response.content.into_iter().enumerate() {
        match block {
            AnthropicContentBlock::Text { text } => content.push_str(&text),
            AnthropicContentBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                id,
                kind: ToolCallKind::Function,
                index,
                function: FunctionCall {
                    name,
                    arguments: encode_input(input),
                },
            }),
            _ => {}
        }
    }

    let finish_reason = response
        .stop_reason
        .as_deref()
        .filter(|reason| !reason.is_empty())
        .map(normalize_stop_reason);

    ChatResponse {
        id: response.id,
        model: response.model,
        choices: vec![Choice {
            index: 0,
            message: Message {
                role: Role::Assistant,
                content,
                tool_calls,
                tool_call_id: None,
                name: None,
            },
            finish_reason,
        }],
        usage: convert_usage(response.usage),
    }
}

/// Re-encodes a decoded input object as JSON text; absent input becomes the
/// literal `null`.
fn encode_input(input: Option<Value>) -> String {
    input.unwrap_or(Value::Null).to_string()
}

/// Normalizes a Messages stop reason into the unified vocabulary.
pub(crate) fn normalize_stop_reason(reason: &str) -> FinishReason {
    match reason {
        "end_turn" | "stop" => FinishReason::Stop,
        "max_tokens" | "length" => FinishReason::Length,
        "tool_use" | "tool_calls" => FinishReason::ToolCalls,
        other => FinishReason::Other(other.to_string()),
    }
}

fn convert_usage(usage: AnthropicUsage) -> Usage {
    Usage {
        prompt_tokens: usage.input_tokens,
        completion_tokens: usage.output_tokens,
        total_tokens: usage.input_tokens + usage.output_tokens,
    }
}
