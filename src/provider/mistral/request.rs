use crate::types::{ChatRequest, Message, Role, Tool, ToolCall};

use super::types::{
    MistralFunction, MistralFunctionCall, MistralMessage, MistralRequest, MistralRequestMessage,
    MistralTool, MistralToolCall, MistralToolResultMessage,
};

/// Maps a unified request onto the Mistral wire shape.
///
/// Every sampling knob has a counterpart here, including `random_seed`.
pub(crate) fn build_request(request: &ChatRequest, model: &str) -> MistralRequest {
    MistralRequest {
        model: model.to_string(),
        messages: request.messages.iter().map(convert_message).collect(),
        temperature: request.temperature,
        top_p: request.top_p,
        max_tokens: request.max_tokens,
        stream: false,
        stop: request.stop.clone(),
        random_seed: request.random_seed,
        tools: request.tools.iter().map(convert_tool).collect(),
        tool_choice: request
            .tool_choice
            .map(|choice| choice.as_str().to_string()),
        presence_penalty: request.presence_penalty,
        frequency_penalty: request.frequency_penalty,
    }
}

fn convert_message(message: &Message) -> MistralRequestMessage {
    if message.role == Role::Tool {
        return MistralRequestMessage::ToolResult(MistralToolResultMessage {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            tool_call_id: message.tool_call_id.clone().unwrap_or_default(),
            name: message.name.clone(),
        });
    }

    MistralRequestMessage::Standard(MistralMessage {
        role: message.role.as_str().to_string(),
        content: (!message.content.is_empty()).then(|| message.content.clone()),
        tool_calls: message.tool_calls.iter().map(convert_tool_call).collect(),
        tool_call_id: message.tool_call_id.clone(),
        name: message.name.clone(),
    })
}

fn convert_tool_call(call: &ToolCall) -> MistralToolCall {
    MistralToolCall {
        id: call.id.clone(),
        kind: call.kind.as_str().to_string(),
        function: MistralFunctionCall {
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
        },
        index: call.index,
    }
}

fn convert_tool(tool: &Tool) -> MistralTool {
    MistralTool {
        kind: "function".to_string(),
        function: MistralFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
            strict: tool.strict,
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn random_seed_reaches_the_wire() {
        let request = ChatRequest {
            messages: vec![Message::user("roll a die")],
            temperature: Some(1.0),
            random_seed: Some(1234),
            ..Default::default()
        };

        let wire = serde_json::to_value(build_request(&request, "mistral-large-latest")).unwrap();
        assert_eq!(wire["model"], "mistral-large-latest");
        assert_eq!(wire["random_seed"], 1234);
        assert_eq!(wire["temperature"], 1.0);

        let unseeded = ChatRequest {
            messages: vec![Message::user("roll a die")],
            ..Default::default()
        };
        let wire = serde_json::to_value(build_request(&unseeded, "mistral-large-latest")).unwrap();
        assert!(wire.get("random_seed").is_none());
    }

    #[test]
    fn tool_result_message_carries_the_tool_name() {
        let mut result = Message::tool("call_3", "{\"temp\":12}");
        result.name = Some("get_weather".to_string());

        let request = ChatRequest {
            messages: vec![result],
            ..Default::default()
        };

        let wire = serde_json::to_value(build_request(&request, "mistral-large-latest")).unwrap();
        assert_eq!(
            wire["messages"][0],
            json!({
                "role": "tool",
                "content": "{\"temp\":12}",
                "tool_call_id": "call_3",
                "name": "get_weather",
            })
        );

        // Without a name the field stays off the wire.
        let anonymous = ChatRequest {
            messages: vec![Message::tool("call_3", "")],
            ..Default::default()
        };
        let wire = serde_json::to_value(build_request(&anonymous, "mistral-large-latest")).unwrap();
        assert_eq!(
            wire["messages"][0],
            json!({"role": "tool", "content": "", "tool_call_id": "call_3"})
        );
    }

    #[test]
    fn assistant_history_round_trips_tool_calls_verbatim() {
        let mut assistant = Message::assistant("checking");
        assistant.tool_calls.push(ToolCall {
            id: "call_3".to_string(),
            index: 1,
            function: crate::types::FunctionCall {
                name: "get_weather".to_string(),
                arguments: "{\"city\":\"Paris\"}".to_string(),
            },
            ..Default::default()
        });

        let request = ChatRequest {
            messages: vec![assistant],
            ..Default::default()
        };

        let wire = serde_json::to_value(build_request(&request, "mistral-large-latest")).unwrap();
        assert_eq!(
            wire["messages"][0]["tool_calls"][0],
            json!({
                "id": "call_3",
                "type": "function",
                "function": {"name": "get_weather", "arguments": "{\"city\":\"Paris\"}"},
                "index": 1,
            })
        );
    }
}
