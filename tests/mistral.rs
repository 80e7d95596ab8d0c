//! End-to-end tests for the Mistral backend over an in-memory transport,
//! plus a live connectivity test gated on credentials.

use std::collections::HashMap;
use std::env;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dotenvy::dotenv;
use futures_util::stream;
use hashi::error::Error;
use hashi::http::reqwest::default_transport;
use hashi::http::{HttpRequest, HttpResponse, HttpStreamResponse, HttpTransport};
use hashi::provider::mistral::MistralProvider;
use hashi::types::{ChatRequest, FinishReason, Message, StreamEvent};
use hashi::{Provider, StreamReader};
use serde_json::Value;

struct ReplayTransport {
    status: u16,
    unary_body: &'static str,
    chunks: Vec<&'static str>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ReplayTransport {
    fn unary(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            status,
            unary_body: body,
            chunks: Vec::new(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn streaming(status: u16, chunks: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            status,
            unary_body: "",
            chunks: chunks.to_vec(),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn recorded(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .first()
            .cloned()
            .expect("provider sent no request")
    }

    fn sent_json(&self) -> Value {
        let request = self.recorded();
        serde_json::from_slice(request.body.as_deref().unwrap_or_default())
            .expect("request body should be JSON")
    }
}

#[async_trait]
impl HttpTransport for ReplayTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        self.requests.lock().unwrap().push(request);
        Ok(HttpResponse {
            status: self.status,
            headers: HashMap::new(),
            body: self.unary_body.as_bytes().to_vec(),
        })
    }

    async fn send_stream(&self, request: HttpRequest) -> Result<HttpStreamResponse, Error> {
        self.requests.lock().unwrap().push(request);
        let chunks: Vec<Result<Vec<u8>, Error>> = self
            .chunks
            .iter()
            .map(|chunk| Ok(chunk.as_bytes().to_vec()))
            .collect();
        Ok(HttpStreamResponse {
            status: self.status,
            headers: HashMap::new(),
            body: Box::pin(stream::iter(chunks)),
        })
    }
}

async fn drain(mut reader: StreamReader) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    loop {
        match reader.recv().await {
            Ok(event) => events.push(event),
            Err(Error::StreamClosed) => return events,
            Err(err) => panic!("stream failed: {err}"),
        }
    }
}

const CHAT_COMPLETION: &str = r#"{
  "id": "cmpl-e5cc70bb28c444948073e77776eb30ef",
  "object": "chat.completion",
  "created": 1702256327,
  "model": "mistral-large-latest",
  "choices": [
    {
      "index": 0,
      "message": {"role": "assistant", "content": "The best French cheese is Comte."},
      "finish_reason": "stop"
    }
  ],
  "usage": {"prompt_tokens": 16, "completion_tokens": 10, "total_tokens": 26}
}"#;

#[tokio::test]
async fn chat_carries_the_seed_and_tool_name_onto_the_wire() {
    let transport = ReplayTransport::unary(200, CHAT_COMPLETION);
    let provider = MistralProvider::new(transport.clone()).with_api_key("mk-test");

    let mut tool_result = Message::tool("call_42", "{\"temp_c\":18}");
    tool_result.name = Some("get_weather".to_string());

    let response = provider
        .chat(ChatRequest {
            messages: vec![Message::user("Best French cheese?"), tool_result],
            random_seed: Some(42),
            ..Default::default()
        })
        .await
        .expect("chat should succeed");

    let request = transport.recorded();
    assert_eq!(request.url, "https://api.mistral.ai/v1/chat/completions");
    assert_eq!(
        request.headers.get("Authorization"),
        Some(&"Bearer mk-test".to_string())
    );

    let sent = transport.sent_json();
    assert_eq!(sent["model"], "mistral-large-latest");
    assert_eq!(sent["random_seed"], 42);
    assert_eq!(sent["stream"], false);
    // Tool results carry the function name alongside the call id.
    assert_eq!(sent["messages"][1]["role"], "tool");
    assert_eq!(sent["messages"][1]["tool_call_id"], "call_42");
    assert_eq!(sent["messages"][1]["name"], "get_weather");

    assert_eq!(response.id, "cmpl-e5cc70bb28c444948073e77776eb30ef");
    assert_eq!(
        response.choices[0].message.content,
        "The best French cheese is Comte."
    );
    assert_eq!(response.choices[0].finish_reason, Some(FinishReason::Stop));
    assert_eq!(response.usage.total_tokens, 26);
}

#[tokio::test]
async fn api_errors_surface_with_status_and_raw_body() {
    let transport = ReplayTransport::unary(
        422,
        r#"{"object":"error","message":"Invalid model: mistral-nonexistent","type":"invalid_model"}"#,
    );
    let provider = MistralProvider::new(transport).with_api_key("mk-test");

    let err = provider
        .chat(ChatRequest {
            messages: vec![Message::user("hi")],
            model: Some("mistral-nonexistent".to_string()),
            ..Default::default()
        })
        .await
        .expect_err("422 must fail");

    match err {
        Error::Api { status, body } => {
            assert_eq!(status, 422);
            assert!(body.contains("Invalid model"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn stream_yields_deltas_and_finish() {
    let transport = ReplayTransport::streaming(
        200,
        &[
            "data: {\"id\":\"cmpl-s1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            "data: {\"id\":\"cmpl-s1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Com\"}}]}\n\ndata: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"te\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\ndata: [DONE]\n\n",
        ],
    );
    let provider = MistralProvider::new(transport.clone()).with_api_key("mk-test");

    let reader = provider
        .stream(ChatRequest {
            messages: vec![Message::user("Best French cheese?")],
            ..Default::default()
        })
        .await
        .expect("stream should open");
    assert_eq!(transport.sent_json()["stream"], true);

    let events = drain(reader).await;
    let texts: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::Delta(delta) => delta.content.as_deref(),
            StreamEvent::Finish(_) => None,
        })
        .collect();
    assert_eq!(texts, vec!["Com", "te"]);
    assert_eq!(events.last(), Some(&StreamEvent::Finish(FinishReason::Stop)));
}

#[tokio::test]
#[ignore = "requires a valid Mistral API key"]
async fn mistral_live_chat_and_stream() {
    dotenv().ok();
    init_tracing();
    let Some(provider) = build_provider_from_env() else {
        return;
    };

    let request = ChatRequest {
        messages: vec![Message::user("Reply with the single word: pong.")],
        ..Default::default()
    };

    let response = provider
        .chat(request.clone())
        .await
        .expect("chat request should succeed");
    assert!(!response.choices[0].message.content.is_empty());

    let reader = provider
        .stream(request)
        .await
        .expect("streaming chat should start");
    let events = drain(reader).await;
    assert!(
        events
            .iter()
            .any(|event| matches!(event, StreamEvent::Delta(_))),
        "stream should yield at least one delta"
    );
    assert!(matches!(events.last(), Some(StreamEvent::Finish(_))));
}

fn build_provider_from_env() -> Option<MistralProvider> {
    let Some(api_key) = load_env_var("MISTRAL_API_KEY") else {
        eprintln!("skip live test: MISTRAL_API_KEY missing");
        return None;
    };

    let transport = default_transport().expect("transport");
    let mut provider = MistralProvider::new(transport).with_api_key(api_key);
    if let Some(model) = load_env_var("MISTRAL_MODEL") {
        provider = provider.with_model(model);
    }
    Some(provider)
}

fn load_env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Honors RUST_LOG so live runs can show the wire traffic.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
