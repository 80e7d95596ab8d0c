use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::types::{
    ChatResponse, Choice, FinishReason, FunctionCall, Message, Role, ToolCall, ToolCallKind, Usage,
};

use super::types::{OllamaResponse, OllamaToolCall};

/// Maps the single `done: true` frame of a unary call onto the unified shape.
///
/// The daemon assigns no response id and echoes no model, so the id is
/// synthesized from the clock and the model is the effective one the facade
/// resolved. Tool calls get positional ids (`call_0`, `call_1`, ...).
pub(crate) fn map_response(response: OllamaResponse, model: &str) -> ChatResponse {
    let content = response.message.content;
    let tool_calls = convert_tool_calls(response.message.tool_calls);
    let finish = finish_reason(response.done_reason.as_deref(), !tool_calls.is_empty());

    ChatResponse {
        id: format!("ollama-{}", unix_nanos()),
        model: model.to_string(),
        choices: vec![Choice {
            index: 0,
            message: Message {
                role: Role::Assistant,
                content,
                tool_calls,
                tool_call_id: None,
                name: None,
            },
            finish_reason: Some(finish),
        }],
        usage: Usage {
            prompt_tokens: response.prompt_eval_count,
            completion_tokens: response.eval_count,
            total_tokens: response.prompt_eval_count + response.eval_count,
        },
    }
}

pub(crate) fn convert_tool_calls(calls: Vec<OllamaToolCall>) -> Vec<ToolCall> {
    calls
        .into_iter()
        .enumerate()
        .map(|(index, call)| ToolCall {
            id: format!("call_{index}"),
            kind: ToolCallKind::Function,
            index,
            function: FunctionCall {
                name: call.function.name,
                arguments: encode_arguments(call.function.arguments),
            },
        })
        .collect()
}

/// Re-encodes decoded arguments as JSON text; absent arguments become the
/// literal `null`.
pub(crate) fn encode_arguments(arguments: Option<Value>) -> String {
    arguments.unwrap_or(Value::Null).to_string()
}

/// `length` outranks the presence of tool calls; everything else with tool
/// calls is `tool_calls`; the rest is a natural stop.
pub(crate) fn finish_reason(done_reason: Option<&str>, has_tool_calls: bool) -> FinishReason {
    if done_reason == Some("length") {
        FinishReason::Length
    } else if has_tool_calls {
        FinishReason::ToolCalls
    } else {
        FinishReason::Stop
    }
}

fn unix_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0)
}
