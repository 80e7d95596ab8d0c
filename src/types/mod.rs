//! Vendor-neutral chat data structures shared across all providers.
//!
//! These types normalize provider-specific payloads so the rest of the crate can stay
//! agnostic of individual API differences: one request/response shape and one
//! streaming event algebra, whatever backend served the call.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Chat role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Instructions that frame the whole conversation.
    System,
    /// End-user input.
    User,
    /// Model output, including tool invocations.
    Assistant,
    /// Result of a tool execution, answering an assistant tool call.
    Tool,
}

impl Role {
    /// Wire representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized chat message shared across providers.
///
/// `content` may be empty when the message carries only tool calls (assistant
/// turns) or only a tool result. A tool-result message always links back to the
/// assistant call that requested it through `tool_call_id`.
///
/// # Examples
///
/// ```
/// use hashi::types::Message;
///
/// let history = vec![
///     Message::system("You are terse."),
///     Message::user("What is 2+2?"),
/// ];
/// assert!(history[0].tool_calls.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role associated with this message.
    pub role: Role,
    /// Plain text content; empty when the message only carries tool data.
    #[serde(default)]
    pub content: String,
    /// Tool invocations authored by the assistant, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Identifier of the [`ToolCall`] this tool-result message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Optional author or tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Creates a system message with the given content.
    pub fn system<T: Into<String>>(content: T) -> Self {
        Self::text(Role::System, content)
    }

    /// Creates a user message with the given content.
    pub fn user<T: Into<String>>(content: T) -> Self {
        Self::text(Role::User, content)
    }

    /// Creates an assistant message with the given content.
    pub fn assistant<T: Into<String>>(content: T) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// Creates a tool-result message answering the call with id `tool_call_id`.
    pub fn tool<I: Into<String>, T: Into<String>>(tool_call_id: I, content: T) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            name: None,
        }
    }

    fn text<T: Into<String>>(role: Role, content: T) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }
}

/// Category of a tool call.
///
/// Every current vendor emits `function`; unrecognized wire values are carried
/// through verbatim instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCallKind {
    /// Call into a caller-defined function.
    Function,
    /// Vendor-specific kind passed through untouched.
    Other(String),
}

impl ToolCallKind {
    /// Wire representation of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            ToolCallKind::Function => "function",
            ToolCallKind::Other(kind) => kind,
        }
    }
}

impl Default for ToolCallKind {
    fn default() -> Self {
        ToolCallKind::Function
    }
}

impl From<&str> for ToolCallKind {
    fn from(value: &str) -> Self {
        match value {
            "function" | "" => ToolCallKind::Function,
            other => ToolCallKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ToolCallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ToolCallKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolCallKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(ToolCallKind::from(value.as_str()))
    }
}

/// Invoked function name plus its JSON arguments as raw text.
///
/// `arguments` stays serialized because vendors may deliver it incrementally
/// as partial text during streaming; the crate never decodes it on behalf of
/// the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name as declared in the matching [`Tool`].
    pub name: String,
    /// JSON-encoded argument object, kept as text.
    #[serde(default)]
    pub arguments: String,
}

/// A model-emitted request to invoke a named function.
///
/// The `id` is vendor-assigned and must be carried back unchanged in the
/// corresponding tool-result message. `index` is the call's position among the
/// tool calls of the same turn and is what streaming consumers key fragment
/// merges on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Vendor-assigned invocation identifier.
    pub id: String,
    /// Category of the call, `function` for every current vendor.
    #[serde(rename = "type", default)]
    pub kind: ToolCallKind,
    /// Position among the tool calls of the same turn.
    #[serde(default)]
    pub index: usize,
    /// Invoked function and raw argument text.
    pub function: FunctionCall,
}

/// Declarative definition of a tool available to the assistant.
///
/// `parameters` is a JSON-Schema-shaped document and is deliberately left
/// untyped: its shape is defined by the caller and passed through to vendors
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Unique name exposed to the model.
    pub name: String,
    /// Natural-language description of what the tool does.
    #[serde(default)]
    pub description: String,
    /// JSON Schema describing the argument object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// Whether the vendor should enforce the schema strictly.
    #[serde(default)]
    pub strict: bool,
}

/// Strategy describing how tools may be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// Provider decides when to call tools.
    Auto,
    /// Tools are disabled for the request.
    None,
    /// Provider must invoke at least one tool.
    Any,
    /// Provider must invoke at least one tool (OpenAI wording).
    Required,
}

impl ToolChoice {
    /// Wire representation of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
            ToolChoice::Any => "any",
            ToolChoice::Required => "required",
        }
    }
}

/// Chat request shared across all providers.
///
/// Sampling controls are optional so that unset and zero stay distinguishable;
/// a vendor that does not support a knob drops it silently rather than
/// rejecting the request. `model`, when set, overrides the provider's
/// configured model for this one call.
///
/// # Examples
///
/// ```
/// use hashi::types::{ChatRequest, Message};
///
/// let request = ChatRequest {
///     messages: vec![
///         Message::system("You are concise."),
///         Message::user("Summarize Rust traits."),
///     ],
///     temperature: Some(0.3),
///     ..Default::default()
/// };
/// assert_eq!(request.messages.len(), 2);
/// assert!(request.max_tokens.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Ordered conversation history to send.
    pub messages: Vec<Message>,
    /// Model override for this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature, typically within `0.0..=2.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling parameter where `1.0` disables the filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum number of output tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sequences that stop generation when produced.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    /// Encourages the model to talk about new topics (`-2.0..=2.0`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Discourages repeating identical tokens (`-2.0..=2.0`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Seed for reproducible sampling where the vendor supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<i64>,
    /// Tool declarations available to the assistant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    /// Strategy describing how tools may be invoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Whether the caller intends to stream; the transport flag actually sent
    /// on the wire is decided by the entry point (`chat` vs `stream`).
    #[serde(default)]
    pub stream: bool,
}

/// Why a chat response stopped generating content.
///
/// The closed set covers every normalized reason; vendor values outside it are
/// carried through verbatim in [`FinishReason::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    /// Natural stop or end of turn.
    Stop,
    /// Hit the max-token / length cap.
    Length,
    /// The model invoked one or more tools.
    ToolCalls,
    /// Unrecognized vendor reason, verbatim.
    Other(String),
}

impl FinishReason {
    /// Wire representation of the reason.
    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::Other(reason) => reason,
        }
    }
}

impl From<&str> for FinishReason {
    fn from(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "tool_calls" => FinishReason::ToolCalls,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

impl From<String> for FinishReason {
    fn from(value: String) -> Self {
        FinishReason::from(value.as_str())
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FinishReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FinishReason {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(FinishReason::from(value.as_str()))
    }
}

/// One ranked completion inside a [`ChatResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Position among the returned choices.
    pub index: usize,
    /// Final assistant message.
    pub message: Message,
    /// Why this choice stopped, when the vendor reported it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// Token usage accounting reported by the vendor.
///
/// Invariant maintained by every response mapper: `total_tokens` equals
/// `prompt_tokens + completion_tokens`, computed locally when the vendor only
/// reports the two parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the request.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Tokens produced by the completion.
    #[serde(default)]
    pub completion_tokens: u32,
    /// Sum of prompt and completion tokens.
    #[serde(default)]
    pub total_tokens: u32,
}

/// Aggregated chat response returned by a provider.
///
/// # Examples
///
/// ```
/// use hashi::types::{ChatResponse, Choice, FinishReason, Message, Usage};
///
/// let response = ChatResponse {
///     id: "chatcmpl-1".into(),
///     model: "gpt-4o".into(),
///     choices: vec![Choice {
///         index: 0,
///         message: Message::assistant("4"),
///         finish_reason: Some(FinishReason::Stop),
///     }],
///     usage: Usage { prompt_tokens: 12, completion_tokens: 1, total_tokens: 13 },
/// };
/// assert_eq!(response.choices[0].message.content, "4");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Vendor-assigned response identifier.
    pub id: String,
    /// Model that actually served the call.
    pub model: String,
    /// Ranked completions, usually a single entry.
    pub choices: Vec<Choice>,
    /// Token accounting for the call.
    #[serde(default)]
    pub usage: Usage,
}

/// Partial function data inside a streamed tool-call fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallDelta {
    /// Function name, present on the fragment that starts the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Raw partial JSON argument text to append.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// One fragment of a tool call delivered during streaming.
///
/// All fragments belonging to the same logical call carry the same `index`;
/// consumers reconstruct the full call by concatenating
/// `function.arguments` text per index, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCallDelta {
    /// Stable position of the logical call within this stream.
    pub index: usize,
    /// Vendor-assigned identifier, present on the starting fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Category of the call, present on the starting fragment.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ToolCallKind>,
    /// Partial function name/arguments.
    #[serde(default)]
    pub function: FunctionCallDelta,
}

/// Incremental content produced while streaming one response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Text fragment to append to the message content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Partial tool-call fragments to merge by index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallDelta>,
}

impl Delta {
    /// Creates a content-only delta.
    pub fn content<T: Into<String>>(text: T) -> Self {
        Self {
            content: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Creates a delta carrying a single tool-call fragment.
    pub fn tool_call(fragment: ToolCallDelta) -> Self {
        Self {
            content: None,
            tool_calls: vec![fragment],
        }
    }
}

/// One event pulled from a streaming response.
///
/// Streams are sequences of `Result<StreamEvent, Error>`: deltas and the
/// terminal finish reason arrive as `Ok`, mid-stream failures as a single
/// terminal `Err`. Replaying the deltas in order reconstructs the same
/// message a non-streaming call would have returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental content and/or tool-call fragments.
    Delta(Delta),
    /// Terminal classification of why the stream ended.
    Finish(FinishReason),
}
