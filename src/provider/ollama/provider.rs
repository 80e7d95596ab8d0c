use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Error;
use crate::http::{
    collect_body_text, post_json_stream_with_headers, post_json_with_headers, DynHttpTransport,
};
use crate::provider::Provider;
use crate::stream::StreamReader;
use crate::types::{ChatRequest, ChatResponse};

use super::request::build_request;
use super::response::map_response;
use super::stream::spawn_stream;
use super::types::OllamaResponse;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Model used when neither the provider nor the request names one.
pub const DEFAULT_MODEL: &str = "llama3.2";

/// Client for a local Ollama daemon.
pub struct OllamaProvider {
    transport: DynHttpTransport,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Creates a provider pointing at the default local daemon.
    pub fn new(transport: DynHttpTransport) -> Self {
        Self {
            transport,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Accepted and ignored; the daemon is unauthenticated. Present so the
    /// vendors stay interchangeable behind one construction pattern.
    #[must_use]
    pub fn with_api_key(self, _api_key: impl Into<String>) -> Self {
        self
    }

    /// Overrides the base URL, e.g. for a daemon on another host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the default model used when requests leave it unset.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn effective_model<'a>(&'a self, request: &'a ChatRequest) -> &'a str {
        request.model.as_deref().unwrap_or(&self.model)
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, Error> {
        let model = self.effective_model(&request);
        let mut wire = build_request(&request, model);
        wire.stream = false;

        debug!(model, "sending chat request");
        let response = post_json_with_headers(
            self.transport.as_ref(),
            self.endpoint(),
            HashMap::new(),
            &wire,
        )
        .await?;
        if !(200..300).contains(&response.status) {
            return Err(Error::api(response.status, response.body_lossy()));
        }

        let decoded: OllamaResponse = serde_json::from_slice(&response.body)
            .map_err(|err| Error::provider("ollama", format!("failed to decode response: {err}")))?;
        Ok(map_response(decoded, model))
    }

    async fn stream(&self, request: ChatRequest) -> Result<StreamReader, Error> {
        let model = self.effective_model(&request);
        let mut wire = build_request(&request, model);
        wire.stream = true;

        debug!(model, "opening chat stream");
        let response = post_json_stream_with_headers(
            self.transport.as_ref(),
            self.endpoint(),
            HashMap::new(),
            &wire,
        )
        .await?;
        if !(200..300).contains(&response.status) {
            let body = collect_body_text(response.body).await;
            return Err(Error::api(response.status, body));
        }

        Ok(spawn_stream(response.body))
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
