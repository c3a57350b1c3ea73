// Claude-backed narrative trade advice.

pub mod advisor;
pub mod client;
pub mod prompt;

pub use advisor::ClaudeTradeAdvisor;
pub use client::{ClaudeClient, LlmClient, LlmEvent, LlmSettings};
