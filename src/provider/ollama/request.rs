use crate::types::{ChatRequest, Message, Tool, ToolCall};

use super::types::{
    OllamaFunction, OllamaFunctionCall, OllamaMessage, OllamaOptions, OllamaRequest, OllamaTool,
    OllamaToolCall,
};

/// Maps a unified request onto the `/api/chat` wire shape.
///
/// `max_tokens` becomes `num_predict` and `random_seed` becomes `seed`;
/// penalties and `tool_choice` have no counterpart and are dropped.
pub(crate) fn build_request(request: &ChatRequest, model: &str) -> OllamaRequest {
    let options = OllamaOptions {
        temperature: request.temperature,
        top_p: request.top_p,
        num_predict: request.max_tokens,
        stop: request.stop.clone(),
        seed: request.random_seed,
    };

    OllamaRequest {
        model: model.to_string(),
        messages: request.messages.iter().map(convert_message).collect(),
        stream: false,
        tools: request.tools.iter().map(convert_tool).collect(),
        options: (!options.is_empty()).then_some(options),
    }
}

fn convert_message(message: &Message) -> OllamaMessage {
    OllamaMessage {
        role: message.role.as_str().to_string(),
        content: message.content.clone(),
        tool_calls: message.tool_calls.iter().map(convert_tool_call).collect(),
    }
}

/// The daemon wants arguments as an object, not text; unparseable argument
/// text degrades to `null` rather than failing the request.
fn convert_tool_call(call: &ToolCall) -> OllamaToolCall {
    OllamaToolCall {
        function: OllamaFunctionCall {
            name: call.function.name.clone(),
            arguments: serde_json::from_str(&call.function.arguments).ok(),
        },
    }
}

fn convert_tool(tool: &Tool) -> OllamaTool {
    OllamaTool {
        kind: "function".to_string(),
        function: OllamaFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}
