//! Config-driven provider construction.
//!
//! Deployments that pick their backend from a settings file deserialize a
//! [`ProviderConfig`] and hand it to [`build_provider`]. Construction never
//! validates credentials: a missing `api_key` is only viable for Ollama and
//! surfaces as an auth failure at call time everywhere else.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::http::DynHttpTransport;
use crate::provider::DynProvider;
use crate::provider::anthropic::AnthropicProvider;
use crate::provider::mistral::MistralProvider;
use crate::provider::ollama::OllamaProvider;
use crate::provider::openai::OpenAiProvider;

/// Backend selector as spelled in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Mistral,
    Ollama,
}

/// One configured backend. Unset fields fall back to the vendor defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Builds the configured provider on top of the given transport.
pub fn build_provider(config: &ProviderConfig, transport: DynHttpTransport) -> DynProvider {
    match config.provider {
        ProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::new(transport);
            if let Some(api_key) = &config.api_key {
                provider = provider.with_api_key(api_key.clone());
            }
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            if let Some(model) = &config.model {
                provider = provider.with_model(model.clone());
            }
            Arc::new(provider)
        }
        ProviderKind::Anthropic => {
            let mut provider = AnthropicProvider::new(transport);
            if let Some(api_key) = &config.api_key {
                provider = provider.with_api_key(api_key.clone());
            }
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            if let Some(model) = &config.model {
                provider = provider.with_model(model.clone());
            }
            Arc::new(provider)
        }
        ProviderKind::Mistral => {
            let mut provider = MistralProvider::new(transport);
            if let Some(api_key) = &config.api_key {
                provider = provider.with_api_key(api_key.clone());
            }
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            if let Some(model) = &config.model {
                provider = provider.with_model(model.clone());
            }
            Arc::new(provider)
        }
        ProviderKind::Ollama => {
            let mut provider = OllamaProvider::new(transport);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            if let Some(model) = &config.model {
                provider = provider.with_model(model.clone());
            }
            Arc::new(provider)
        }
    }
}
