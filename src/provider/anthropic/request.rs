use serde_json::Value;

use crate::types::{ChatRequest, Message, Role, Tool, ToolCall};

use super::provider::DEFAULT_MAX_TOKENS;
use super::types::{AnthropicContentBlock, AnthropicMessage, AnthropicRequest, AnthropicTool};

/// Maps a unified request onto the Messages wire shape.
///
/// Knobs without a counterpart here (temperature, top_p, stop, penalties,
/// seed, tool_choice) are dropped. `max_tokens` is mandatory on this endpoint
/// and falls back to [`DEFAULT_MAX_TOKENS`] when the caller leaves it unset.
pub(crate) fn build_request(request: &ChatRequest, model: &str) -> AnthropicRequest {
    let mut system = None;
    let mut messages = Vec::new();

    for message in &request.messages {
        match message.role {
            Role::System => {
                // First system message wins; later ones are dropped.
                if system.is_none() {
                    system = Some(message.content.clone());
                }
            }
            Role::User => messages.push(AnthropicMessage {
                role: "user".to_string(),
                content: vec![AnthropicContentBlock::Text {
                    text: message.content.clone(),
                }],
            }),
            Role::Assistant => {
                if let Some(converted) = convert_assistant(message) {
                    messages.push(converted);
                }
            }
            Role::Tool => messages.push(AnthropicMessage {
                role: "user".to_string(),
                content: vec![AnthropicContentBlock::ToolResult {
                    tool_use_id: message.tool_call_id.clone().unwrap_or_default(),
                    content: message.content.clone(),
                }],
            }),
        }
    }

    AnthropicRequest {
        model: model.to_string(),
        messages,
        system,
        max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        stream: false,
        tools: request.tools.iter().map(convert_tool).collect(),
    }
}

/// Returns `None` for an assistant message with neither content nor tool
/// calls; the endpoint rejects messages with an empty block list.
fn convert_assistant(message: &Message) -> Option<AnthropicMessage> {
    let mut content = Vec::new();
    if !message.content.is_empty() {
        content.push(AnthropicContentBlock::Text {
            text: message.content.clone(),
        });
    }
    for call in &message.tool_calls {
        content.push(AnthropicContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.function.name.clone(),
            input: decode_arguments(call),
        });
    }
    (!content.is_empty()).then(|| AnthropicMessage {
        role: "assistant".to_string(),
        content,
    })
}

/// Best effort: unparseable argument text yields an absent input rather than
/// failing the whole request.
fn decode_arguments(call: &ToolCall) -> Option<Value> {
    if call.function.arguments.is_empty() {
        return None;
    }
    serde_json::from_str(&call.function.arguments).ok()
}

fn convert_tool(tool: &Tool) -> AnthropicTool {
    AnthropicTool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        input_schema: tool.parameters.clone(),
    }
}
