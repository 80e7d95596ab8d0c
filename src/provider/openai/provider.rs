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
use super::types::OpenAiResponse;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Model used when neither the provider nor the request names one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Client for the OpenAI Chat Completions API.
///
/// Construct with [`OpenAiProvider::new`] and adjust via the `with_*` builders:
///
/// ```no_run
/// use hashi::http::reqwest::default_transport;
/// use hashi::provider::openai::OpenAiProvider;
///
/// # fn main() -> Result<(), hashi::Error> {
/// let provider = OpenAiProvider::new(default_transport()?)
///     .with_api_key("sk-...")
///     .with_model("gpt-4o-mini");
/// # Ok(())
/// # }
/// ```
pub struct OpenAiProvider {
    transport: DynHttpTransport,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    /// Creates a provider with the default base URL and model.
    pub fn new(transport: DynHttpTransport) -> Self {
        Self {
            transport,
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Sets the API key sent as a bearer token.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Overrides the base URL, e.g. for a proxy or compatible server.
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
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{base}/chat/completions")
        } else {
            format!("{base}/v1/chat/completions")
        }
    }

    fn headers(&self) -> HashMap<String, String> {
        HashMap::from([(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )])
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, Error> {
        let model = self.effective_model(&request);
        let mut wire = build_request(&request, model);
        wire.stream = false;

        debug!(model, "sending chat request");
        let response =
            post_json_with_headers(self.transport.as_ref(), self.endpoint(), self.headers(), &wire)
                .await?;
        if !(200..300).contains(&response.status) {
            return Err(Error::api(response.status, response.body_lossy()));
        }

        let decoded: OpenAiResponse = serde_json::from_slice(&response.body)
            .map_err(|err| Error::provider("openai", format!("failed to decode response: {err}")))?;
        Ok(map_response(decoded))
    }

    async fn stream(&self, request: ChatRequest) -> Result<StreamReader, Error> {
        let model = self.effective_model(&request);
        let mut wire = build_request(&request, model);
        wire.stream = true;

        let mut headers = self.headers();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        debug!(model, "opening chat stream");
        let response =
            post_json_stream_with_headers(self.transport.as_ref(), self.endpoint(), headers, &wire)
                .await?;
        if !(200..300).contains(&response.status) {
            let body = collect_body_text(response.body).await;
            return Err(Error::api(response.status, body));
        }

        Ok(spawn_stream(response.body))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
