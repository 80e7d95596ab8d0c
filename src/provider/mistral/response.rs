use crate::types::{
    ChatResponse, Choice, FinishReason, FunctionCall, Message, Role, ToolCall, ToolCallKind, Usage,
};

use super::types::{MistralChoice, MistralMessage, MistralResponse, MistralToolCall, MistralUsage};

/// Maps a Mistral response body onto the unified shape.
pub(crate) fn map_response(response: MistralResponse) -> ChatResponse {
    ChatResponse {
        id: response.id,
        model: response.model,
        choices: response.choices.into_iter().map(convert_choice).collect(),
        usage: convert_usage(response.usage),
    }
}

fn convert_choice(choice: MistralChoice) -> Choice {
    Choice {
        index: choice.index,
        message: convert_message(choice.message),
        finish_reason: choice.finish_reason.as_deref().map(FinishReason::from),
    }
}

fn convert_message(message: MistralMessage) -> Message {
    Message {
        role: parse_role(&message.role),
        content: message.content.unwrap_or_default(),
        tool_calls: message
            .tool_calls
            .into_iter()
            .map(convert_tool_call)
            .collect(),
        tool_call_id: message.tool_call_id,
        name: message.name,
    }
}

fn convert_tool_call(call: MistralToolCall) -> ToolCall {
    ToolCall {
        id: call.id,
        kind: ToolCallKind::from(call.kind.as_str()),
        index: call.index,
        function: FunctionCall {
            name: call.function.name,
            arguments: call.function.arguments,
        },
    }
}

fn parse_role(role: &str) -> Role {
    match role {
        "system" => Role::System,
        "user" => Role::User,
        "tool" => Role::Tool,
        _ => Role::Assistant,
    }
}

fn convert_usage(usage: MistralUsage) -> Usage {
    Usage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    }
}
