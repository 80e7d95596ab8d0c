//! OpenAI Chat Completions backend.

mod provider;
mod request;
mod response;
mod stream;
mod types;

pub use provider::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiProvider};
