use crate::types::{ChatRequest, Message, Role, Tool, ToolCall};

use super::types::{
    OpenAiFunction, OpenAiFunctionCall, OpenAiMessage, OpenAiRequest, OpenAiRequestMessage,
    OpenAiTool, OpenAiToolCall, OpenAiToolResultMessage,
};

/// Maps a unified request onto the Chat Completions wire shape.
///
/// The mapping is total: knobs the endpoint does not support are dropped
/// instead of rejected. `random_seed` has no Chat Completions counterpart.
pub(crate) fn build_request(request: &ChatRequest, model: &str) -> OpenAiRequest {
    OpenAiRequest {
        model: model.to_string(),
        messages: request.messages.iter().map(convert_message).collect(),
        temperature: request.temperature,
        top_p: request.top_p,
        max_tokens: request.max_tokens,
        stream: false,
        stop: request.stop.clone(),
        tools: request.tools.iter().map(convert_tool).collect(),
        tool_choice: request
            .tool_choice
            .map(|choice| choice.as_str().to_string()),
        presence_penalty: request.presence_penalty,
        frequency_penalty: request.frequency_penalty,
    }
}

fn convert_message(message: &Message) -> OpenAiRequestMessage {
    if message.role == Role::Tool {
        return OpenAiRequestMessage::ToolResult(OpenAiToolResultMessage {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            tool_call_id: message.tool_call_id.clone().unwrap_or_default(),
        });
    }

    OpenAiRequestMessage::Standard(OpenAiMessage {
        role: message.role.as_str().to_string(),
        content: (!message.content.is_empty()).then(|| message.content.clone()),
        tool_calls: message.tool_calls.iter().map(convert_tool_call).collect(),
        tool_call_id: message.tool_call_id.clone(),
        name: message.name.clone(),
    })
}

fn convert_tool_call(call: &ToolCall) -> OpenAiToolCall {
    OpenAiToolCall {
        id: call.id.clone(),
        kind: call.kind.as_str().to_string(),
        function: OpenAiFunctionCall {
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
        },
        index: call.index,
    }
}

fn convert_tool(tool: &Tool) -> OpenAiTool {
    OpenAiTool {
        kind: "function".to_string(),
        function: OpenAiFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
            strict: tool.strict,
        },
    }
}
