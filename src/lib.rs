//! Unified chat client over multiple LLM HTTP backends.
//!
//! One request/response shape and one streaming event algebra cover OpenAI,
//! Anthropic, Mistral and Ollama. Each vendor module adapts the shared types
//! to its wire format behind the [`Provider`] trait, on top of a pluggable
//! [`HttpTransport`](http::HttpTransport) so tests can drive providers with
//! in-memory doubles while production uses the bundled reqwest transport.

pub mod config;
pub mod error;
pub mod http;
pub mod provider;
mod sse;
pub mod stream;
pub mod tool;
pub mod types;

pub use error::Error;
pub use provider::{DynProvider, Provider};
pub use stream::StreamReader;
pub use types::*;
