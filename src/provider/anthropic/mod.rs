//! Anthropic Messages backend.
//!
//! Structurally the furthest from the Chat Completions family: content is a
//! list of typed blocks, the system prompt is a top-level field, `max_tokens`
//! is mandatory, and streams are typed events ending in `message_stop`.

mod provider;
mod request;
mod response;
mod stream;
mod types;

pub use provider::{AnthropicProvider, DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
