//! Wire shapes for the Ollama `/api/chat` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request payload. The same shape serves unary and streaming calls; the
/// daemon streams by default, so `stream` is always spelled out.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct OllamaRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<OllamaMessage>,
    pub(crate) stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) tools: Vec<OllamaTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) options: Option<OllamaOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct OllamaMessage {
    #[serde(default)]
    pub(crate) role: String,
    #[serde(default)]
    pub(crate) content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) tool_calls: Vec<OllamaToolCall>,
}

/// Tool call as Ollama frames it: no id, no index, decoded arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct OllamaToolCall {
    #[serde(default)]
    pub(crate) function: OllamaFunctionCall,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct OllamaFunctionCall {
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) arguments: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OllamaTool {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) function: OllamaFunction,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct OllamaFunction {
    pub(crate) name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub(crate) description: String,
    pub(crate) parameters: Option<Value>,
}

/// Sampling knobs; the whole object stays off the wire when nothing is set.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) stop: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) seed: Option<i64>,
}

impl OllamaOptions {
    pub(crate) fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.num_predict.is_none()
            && self.stop.is_empty()
            && self.seed.is_none()
    }
}

/// One response frame. Unary calls receive exactly one with `done: true`;
/// streams receive many, the last one carrying `done` and the eval counters.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OllamaResponse {
    #[serde(default)]
    pub(crate) message: OllamaMessage,
    #[serde(default)]
    pub(crate) done: bool,
    #[serde(default)]
    pub(crate) done_reason: Option<String>,
    #[serde(default)]
    pub(crate) prompt_eval_count: u32,
    #[serde(default)]
    pub(crate) eval_count: u32,
}
