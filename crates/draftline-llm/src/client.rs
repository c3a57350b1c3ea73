// Claude API streaming client using reqwest-eventsource.
//
// Sends messages to the Anthropic Messages API with `stream: true` and parses
// the Server-Sent Events into `LlmEvent` variants forwarded over an mpsc
// channel. `complete` drains that channel into a single reply for callers
// that only want the final text.

use std::time::Duration;

use anyhow::{anyhow, bail};
use futures_util::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Events and settings
// ---------------------------------------------------------------------------

/// Outcome of one streamed request. Text deltas are accumulated by the
/// client; exactly one event is sent per request.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmEvent {
    Complete {
        full_text: String,
        input_tokens: u32,
        output_tokens: u32,
    },
    Error {
        message: String,
    },
}

/// The `[llm]` table of strategy.toml.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        LlmSettings {
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

// ---------------------------------------------------------------------------
// ClaudeClient
// ---------------------------------------------------------------------------

/// Low-level Claude API streaming client.
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    /// Send a message and stream the response as `LlmEvent`s over `tx`.
    ///
    /// Returns when the stream completes, fails, or the receiver is dropped.
    /// Failures are reported as `LlmEvent::Error`, not as `Err`.
    pub async fn stream_message(
        &self,
        system: &str,
        user_content: &str,
        max_tokens: u32,
        tx: mpsc::Sender<LlmEvent>,
    ) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            let _ = tx
                .send(LlmEvent::Error {
                    message: "API key not configured".to_string(),
                })
                .await;
            return Ok(());
        }

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "stream": true,
            "system": system,
            "messages": [{ "role": "user", "content": user_content }]
        });

        let request = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let mut es = match request.eventsource() {
            Ok(es) => es,
            Err(e) => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: format!("Failed to create event source: {e}"),
                    })
                    .await;
                return Ok(());
            }
        };

        let mut full_text = String::new();
        let mut input_tokens: u32 = 0;
        let mut output_tokens: u32 = 0;

        while let Some(event) = es.next().await {
            match event {
                Ok(Event::Open) => debug!("SSE connection opened"),
                Ok(Event::Message(msg)) => match msg.event.as_str() {
                    "message_start" => {
                        match parse_input_tokens(&msg.data) {
                            Some(n) => input_tokens = n,
                            None => warn!("failed to parse input_tokens from message_start"),
                        }
                        debug!(input_tokens, "message_start");
                    }
                    "content_block_delta" => {
                        if tx.is_closed() {
                            // Receiver gone.
                            es.close();
                            return Ok(());
                        }
                        if let Some(text) = parse_delta_text(&msg.data) {
                            full_text.push_str(&text);
                        }
                    }
                    "message_delta" => {
                        match parse_output_tokens(&msg.data) {
                            Some(n) => output_tokens = n,
                            None => warn!("failed to parse output_tokens from message_delta"),
                        }
                        debug!(output_tokens, "message_delta");
                    }
                    "message_stop" => {
                        debug!("message_stop, streaming complete");
                        let _ = tx
                            .send(LlmEvent::Complete {
                                full_text,
                                input_tokens,
                                output_tokens,
                            })
                            .await;
                        es.close();
                        return Ok(());
                    }
                    "error" => {
                        let message = parse_stream_error(&msg.data)
                            .unwrap_or_else(|| "API reported an error".to_string());
                        warn!(%message, "error event in stream");
                        let _ = tx.send(LlmEvent::Error { message }).await;
                        es.close();
                        return Ok(());
                    }
                    other => debug!(event_type = other, "ignoring SSE event"),
                },
                Err(err) => {
                    warn!(?err, "SSE stream error");
                    let _ = tx
                        .send(LlmEvent::Error {
                            message: extract_error_message(&err),
                        })
                        .await;
                    es.close();
                    return Ok(());
                }
            }
        }

        // Stream ended without message_stop.
        let event = if full_text.is_empty() {
            LlmEvent::Error {
                message: "Stream ended unexpectedly without any content".to_string(),
            }
        } else {
            LlmEvent::Complete {
                full_text,
                input_tokens,
                output_tokens,
            }
        };
        let _ = tx.send(event).await;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LlmClient wrapper
// ---------------------------------------------------------------------------

/// Either an active Claude client or disabled (no API key).
pub enum LlmClient {
    Active(ClaudeClient),
    Disabled,
}

impl LlmClient {
    /// `Active` when a non-empty API key is supplied.
    pub fn from_settings(api_key: Option<&str>, settings: &LlmSettings) -> Self {
        match api_key {
            Some(key) if !key.trim().is_empty() => LlmClient::Active(ClaudeClient::new(
                key.trim().to_string(),
                settings.model.clone(),
            )),
            _ => LlmClient::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, LlmClient::Active(_))
    }

    pub async fn stream_message(
        &self,
        system: &str,
        user_content: &str,
        max_tokens: u32,
        tx: mpsc::Sender<LlmEvent>,
    ) -> anyhow::Result<()> {
        match self {
            LlmClient::Active(client) => {
                client
                    .stream_message(system, user_content, max_tokens, tx)
                    .await
            }
            LlmClient::Disabled => {
                let _ = tx
                    .send(LlmEvent::Error {
                        message: "LLM not configured".to_string(),
                    })
                    .await;
                Ok(())
            }
        }
    }

    /// Stream a message and collect the whole reply, bounded by `timeout`.
    pub async fn complete(
        &self,
        system: &str,
        user_content: &str,
        max_tokens: u32,
        timeout: Duration,
    ) -> anyhow::Result<String> {
        let (tx, rx) = mpsc::channel(64);
        let stream = self.stream_message(system, user_content, max_tokens, tx);

        let joined = tokio::time::timeout(timeout, async {
            let (streamed, collected) = tokio::join!(stream, collect_reply(rx));
            streamed?;
            collected
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(_) => Err(anyhow!("LLM request timed out after {}s", timeout.as_secs())),
        }
    }
}

/// Drain events until the stream completes or fails.
async fn collect_reply(mut rx: mpsc::Receiver<LlmEvent>) -> anyhow::Result<String> {
    while let Some(event) = rx.recv().await {
        match event {
            LlmEvent::Complete {
                full_text,
                input_tokens,
                output_tokens,
            } => {
                debug!(input_tokens, output_tokens, "LLM reply collected");
                return Ok(full_text);
            }
            LlmEvent::Error { message } => bail!("{message}"),
        }
    }
    bail!("LLM stream closed without a reply")
}

// ---------------------------------------------------------------------------
// SSE JSON parsing helpers
// ---------------------------------------------------------------------------

/// `{ "type": "message_start", "message": { "usage": { "input_tokens": N } } }`
pub(crate) fn parse_input_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("message")?
        .get("usage")?
        .get("input_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// `{ "type": "content_block_delta", "delta": { "type": "text_delta", "text": "..." } }`
pub(crate) fn parse_delta_text(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("delta")?.get("text")?.as_str().map(|s| s.to_string())
}

/// `{ "type": "message_delta", "usage": { "output_tokens": N } }`
pub(crate) fn parse_output_tokens(data: &str) -> Option<u32> {
    let v: Value = serde_json::from_str(data).ok()?;
    v.get("usage")?
        .get("output_tokens")?
        .as_u64()
        .map(|n| n as u32)
}

/// `{ "type": "error", "error": { "type": "overloaded_error", "message": "..." } }`
pub(crate) fn parse_stream_error(data: &str) -> Option<String> {
    let v: Value = serde_json::from_str(data).ok()?;
    let error = v.get("error")?;
    let message = error.get("message")?.as_str()?;
    match error.get("type").and_then(Value::as_str) {
        Some(kind) => Some(format!("{kind}: {message}")),
        None => Some(message.to_string()),
    }
}

fn extract_error_message(err: &reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _response) => {
            format!("API returned status {status}")
        }
        reqwest_eventsource::Error::Transport(e) => format!("Network error: {e}"),
        other => format!("Stream error: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_message_start_input_tokens() {
        let data = r#"{
            "type": "message_start",
            "message": {
                "id": "msg_123",
                "role": "assistant",
                "usage": { "input_tokens": 42, "output_tokens": 0 }
            }
        }"#;
        assert_eq!(parse_input_tokens(data), Some(42));
        assert_eq!(parse_input_tokens(r#"{ "message": {} }"#), None);
        assert_eq!(parse_input_tokens("not json"), None);
    }

    #[test]
    fn parse_content_block_delta_text() {
        let data = r#"{
            "type": "content_block_delta",
            "index": 0,
            "delta": { "type": "text_delta", "text": "[{\"give\"" }
        }"#;
        assert_eq!(parse_delta_text(data), Some("[{\"give\"".to_string()));
        assert_eq!(parse_delta_text(r#"{ "index": 0 }"#), None);
        assert_eq!(parse_delta_text("{broken"), None);
    }

    #[test]
    fn parse_message_delta_output_tokens() {
        let data = r#"{
            "type": "message_delta",
            "delta": { "stop_reason": "end_turn" },
            "usage": { "output_tokens": 128 }
        }"#;
        assert_eq!(parse_output_tokens(data), Some(128));
        assert_eq!(parse_output_tokens(r#"{ "delta": {} }"#), None);
    }

    #[test]
    fn parse_error_event() {
        let data = r#"{"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}"#;
        assert_eq!(
            parse_stream_error(data),
            Some("overloaded_error: Overloaded".to_string())
        );
        assert_eq!(parse_stream_error(r#"{"type": "error"}"#), None);
    }

    #[test]
    fn settings_defaults_fill_missing_keys() {
        let settings: LlmSettings = serde_json::from_str(r#"{"model": "claude-test"}"#).unwrap();
        assert_eq!(settings.model, "claude-test");
        assert_eq!(settings.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(settings.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn from_settings_requires_key() {
        let settings = LlmSettings::default();
        assert!(LlmClient::from_settings(Some("sk-ant-test"), &settings).is_enabled());
        assert!(!LlmClient::from_settings(Some("  "), &settings).is_enabled());
        assert!(!LlmClient::from_settings(None, &settings).is_enabled());
    }

    #[tokio::test]
    async fn disabled_client_sends_error_event() {
        let client = LlmClient::Disabled;
        let (tx, mut rx) = mpsc::channel(8);
        client
            .stream_message("system", "user", 100, tx)
            .await
            .expect("should not fail");

        assert_eq!(
            rx.recv().await,
            Some(LlmEvent::Error {
                message: "LLM not configured".to_string(),
            })
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_api_key_sends_error_event() {
        let client = ClaudeClient::new(String::new(), "model".to_string());
        let (tx, mut rx) = mpsc::channel(8);
        client.stream_message("system", "user", 100, tx).await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(LlmEvent::Error {
                message: "API key not configured".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn complete_surfaces_disabled_as_error() {
        let err = LlmClient::Disabled
            .complete("system", "user", 100, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "LLM not configured");
    }

    #[tokio::test]
    async fn collect_reply_returns_full_text() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(LlmEvent::Complete {
            full_text: "[]".to_string(),
            input_tokens: 10,
            output_tokens: 2,
        })
        .await
        .unwrap();
        drop(tx);
        assert_eq!(collect_reply(rx).await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn collect_reply_without_completion_fails() {
        let (tx, rx) = mpsc::channel::<LlmEvent>(1);
        drop(tx);
        assert!(collect_reply(rx).await.is_err());
    }
}
