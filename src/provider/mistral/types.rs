//! Wire shapes for the Mistral chat completions endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

/// Request payload for `POST /v1/chat/completions` on La Plateforme.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MistralRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<MistralRequestMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_tokens: Option<u32>,
    pub(crate) stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) stop: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) random_seed: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) tools: Vec<MistralTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) frequency_penalty: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub(crate) enum MistralRequestMessage {
    ToolResult(MistralToolResultMessage),
    Standard(MistralMessage),
}

/// Flat tool-result message. Unlike the Chat Completions shape it also names
/// the tool that produced the result; `content` is mandatory even when empty.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MistralToolResultMessage {
    pub(crate) role: String,
    pub(crate) content: String,
    pub(crate) tool_call_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct MistralMessage {
    #[serde(default)]
    pub(crate) role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) tool_calls: Vec<MistralToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct MistralToolCall {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(rename = "type", default)]
    pub(crate) kind: String,
    #[serde(default)]
    pub(crate) function: MistralFunctionCall,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub(crate) index: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct MistralFunctionCall {
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) arguments: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MistralTool {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) function: MistralFunction,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MistralFunction {
    pub(crate) name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub(crate) description: String,
    pub(crate) parameters: Option<Value>,
    #[serde(skip_serializing_if = "is_false")]
    pub(crate) strict: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MistralResponse {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) model: String,
    #[serde(default)]
    pub(crate) choices: Vec<MistralChoice>,
    #[serde(default)]
    pub(crate) usage: MistralUsage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MistralChoice {
    #[serde(default)]
    pub(crate) index: usize,
    #[serde(default)]
    pub(crate) message: MistralMessage,
    #[serde(default)]
    pub(crate) finish_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct MistralUsage {
    #[serde(default)]
    pub(crate) prompt_tokens: u32,
    #[serde(default)]
    pub(crate) completion_tokens: u32,
    #[serde(default)]
    pub(crate) total_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MistralStreamChunk {
    #[serde(default)]
    pub(crate) choices: Vec<MistralStreamChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MistralStreamChoice {
    #[serde(default)]
    pub(crate) delta: MistralStreamDelta,
    #[serde(default)]
    pub(crate) finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MistralStreamDelta {
    #[serde(default)]
    pub(crate) content: Option<String>,
    #[serde(default)]
    pub(crate) tool_calls: Vec<MistralStreamToolCall>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MistralStreamToolCall {
    #[serde(default)]
    pub(crate) index: usize,
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(rename = "type", default)]
    pub(crate) kind: Option<String>,
    #[serde(default)]
    pub(crate) function: MistralStreamFunction,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct MistralStreamFunction {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) arguments: Option<String>,
}
