//! Vendor backends and the unified [`Provider`] interface they implement.
//!
//! Each submodule adapts one vendor API: request mapping, response mapping,
//! and stream decoding live next to each other so a backend can be read as a
//! unit. Callers usually hold a [`DynProvider`] and never touch the wire
//! shapes directly.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use crate::stream::StreamReader;
use crate::types::{ChatRequest, ChatResponse};

pub mod anthropic;
pub mod mistral;
pub mod ollama;
pub mod openai;

/// Unified chat interface implemented by every vendor backend.
///
/// # Examples
///
/// ```no_run
/// use hashi::http::reqwest::default_transport;
/// use hashi::provider::Provider;
/// use hashi::provider::openai::OpenAiProvider;
/// use hashi::types::{ChatRequest, Message};
///
/// # async fn run() -> Result<(), hashi::error::Error> {
/// let provider = OpenAiProvider::new(default_transport()?).with_api_key("sk-...");
/// let response = provider
///     .chat(ChatRequest {
///         messages: vec![Message::user("2+2?")],
///         ..Default::default()
///     })
///     .await?;
/// println!("{}", response.choices[0].message.content);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Sends a complete request and waits for the full response.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, Error>;

    /// Starts a streaming request and returns a reader over incremental events.
    ///
    /// Failures before streaming begins (connection, auth, non-success status)
    /// are returned here; failures after the first byte surface as a terminal
    /// error event through the reader.
    async fn stream(&self, request: ChatRequest) -> Result<StreamReader, Error>;

    /// Stable provider name used in logs and errors.
    fn name(&self) -> &'static str;
}

/// Thread-safe shared provider handle.
pub type DynProvider = Arc<dyn Provider>;
