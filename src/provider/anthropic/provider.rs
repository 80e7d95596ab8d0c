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
use super::types::AnthropicResponse;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Model used when neither the provider nor the request names one.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Output cap applied when the caller leaves `max_tokens` unset; the
/// Messages endpoint requires an explicit value.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

const API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API.
pub struct AnthropicProvider {
    transport: DynHttpTransport,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicProvider {
    /// Creates a provider with the default base URL and model.
    pub fn new(transport: DynHttpTransport) -> Self {
        Self {
            transport,
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Sets the API key sent in the `x-api-key` header.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Overrides the base URL.
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
            format!("{base}/messages")
        } else {
            format!("{base}/v1/messages")
        }
    }

    fn headers(&self) -> HashMap<String, String> {
        HashMap::from([
            ("x-api-key".to_string(), self.api_key.clone()),
            ("anthropic-version".to_string(), API_VERSION.to_string()),
        ])
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
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

        let decoded: AnthropicResponse = serde_json::from_slice(&response.body).map_err(|err| {
            Error::provider("anthropic", format!("failed to decode response: {err}"))
        })?;
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
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::http::{HttpRequest, HttpResponse, HttpStreamResponse, HttpTransport};

    struct UnreachableTransport;

    #[async_trait]
    impl HttpTransport for UnreachableTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, Error> {
            panic!("no request expected");
        }

        async fn send_stream(&self, _request: HttpRequest) -> Result<HttpStreamResponse, Error> {
            panic!("no request expected");
        }
    }

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(Arc::new(UnreachableTransport))
    }

    #[test]
    fn endpoint_targets_the_messages_route() {
        assert_eq!(provider().endpoint(), "https://api.anthropic.com/v1/messages");

        let proxied = provider().with_base_url("https://gateway.example/v1");
        assert_eq!(proxied.endpoint(), "https://gateway.example/v1/messages");
    }

    #[test]
    fn headers_use_api_key_and_version_instead_of_bearer() {
        let headers = provider().with_api_key("ak-test").headers();
        assert_eq!(headers.get("x-api-key").map(String::as_str), Some("ak-test"));
        assert_eq!(
            headers.get("anthropic-version").map(String::as_str),
            Some("2023-06-01")
        );
        assert!(!headers.contains_key("Authorization"));
    }

    #[test]
    fn request_model_overrides_the_configured_default() {
        let provider = provider();
        let unset = ChatRequest::default();
        assert_eq!(provider.effective_model(&unset), DEFAULT_MODEL);

        let set = ChatRequest {
            model: Some("claude-haiku-latest".to_string()),
            ..ChatRequest::default()
        };
        assert_eq!(provider.effective_model(&set), "claude-haiku-latest");
    }
}
