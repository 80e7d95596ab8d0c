//! Wire shapes for the Anthropic Messages endpoint.
//!
//! Stream frames and content blocks are internally tagged by `type`. Unknown
//! tags fall into the `Ignored` variants so new block or event kinds pass
//! through silently; known tags with ill-typed fields fail decoding instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request payload for `POST /v1/messages`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AnthropicRequest {
    pub(crate) model: String,
    pub(crate) messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) system: Option<String>,
    pub(crate) max_tokens: u32,
    pub(crate) stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) tools: Vec<AnthropicTool>,
}

/// Block-structured chat message.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct AnthropicMessage {
    pub(crate) role: String,
    pub(crate) content: Vec<AnthropicContentBlock>,
}

/// Content block used in both requests and non-streaming responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum AnthropicContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        input: Option<Value>,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default)]
        content: String,
    },
    /// Block kinds this crate does not model, e.g. `thinking`.
    #[serde(other)]
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AnthropicTool {
    pub(crate) name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub(crate) description: String,
    pub(crate) input_schema: Option<Value>,
}

/// Response body of a non-streaming call.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AnthropicResponse {
    #[serde(default)]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) model: String,
    #[serde(default)]
    pub(crate) content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    pub(crate) stop_reason: Option<String>,
    #[serde(default)]
    pub(crate) usage: AnthropicUsage,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct AnthropicUsage {
    #[serde(default)]
    pub(crate) input_tokens: u32,
    #[serde(default)]
    pub(crate) output_tokens: u32,
}

/// One SSE `data:` payload of a streaming call, keyed by its `type` tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum AnthropicStreamEvent {
    ContentBlockStart {
        #[serde(default)]
        index: u64,
        #[serde(default)]
        content_block: AnthropicStreamBlock,
    },
    ContentBlockDelta {
        #[serde(default)]
        index: u64,
        #[serde(default)]
        delta: AnthropicStreamDelta,
    },
    MessageDelta {
        #[serde(default)]
        delta: AnthropicMessageDelta,
    },
    MessageStop,
    /// `message_start`, `content_block_stop`, `ping`, and future event kinds.
    #[serde(other)]
    Ignored,
}

/// Opening shape of a content block inside a stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum AnthropicStreamBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
    },
    #[serde(other)]
    Ignored,
}

impl Default for AnthropicStreamBlock {
    fn default() -> Self {
        Self::Ignored
    }
}

/// Incremental payload of a `content_block_delta` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum AnthropicStreamDelta {
    TextDelta {
        #[serde(default)]
        text: String,
    },
    InputJsonDelta {
        #[serde(default)]
        partial_json: String,
    },
    #[serde(other)]
    Ignored,
}

impl Default for AnthropicStreamDelta {
    fn default() -> Self {
        Self::Ignored
    }
}

/// Turn-level metadata carried by `message_delta` events.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct AnthropicMessageDelta {
    #[serde(default)]
    pub(crate) stop_reason: Option<String>,
}
