//! Ollama local daemon backend.
//!
//! Talks NDJSON to `/api/chat`: one JSON frame per line, terminated by a
//! frame carrying `done: true`. The daemon is unauthenticated and sampling
//! knobs ride in a nested `options` object.

mod provider;
mod request;
mod response;
mod stream;
mod types;

pub use provider::{DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaProvider};
