//! Mistral La Plateforme chat backend.
//!
//! The wire protocol tracks the Chat Completions shape with two additions:
//! a `random_seed` sampling knob and a `name` field on tool result messages.

mod provider;
mod request;
mod response;
mod stream;
mod types;

pub use provider::{DEFAULT_BASE_URL, DEFAULT_MODEL, MistralProvider};
