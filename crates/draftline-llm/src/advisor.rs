// TradeAdvisor backed by the Claude client.

use std::time::Duration;

use async_trait::async_trait;
use draftline_core::trade::advisor::{AdviceRequest, AdvisorError, TradeAdvisor};
use tracing::{debug, info};

use crate::client::{LlmClient, LlmSettings};
use crate::prompt::{build_trade_prompt, system_prompt};

pub struct ClaudeTradeAdvisor {
    client: LlmClient,
    max_tokens: u32,
    timeout: Duration,
}

impl ClaudeTradeAdvisor {
    pub fn new(client: LlmClient, settings: &LlmSettings) -> Self {
        ClaudeTradeAdvisor {
            client,
            max_tokens: settings.max_tokens,
            timeout: settings.timeout(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_enabled()
    }
}

#[async_trait]
impl TradeAdvisor for ClaudeTradeAdvisor {
    async fn advise(&self, request: &AdviceRequest) -> Result<String, AdvisorError> {
        if !self.client.is_enabled() {
            return Err(AdvisorError::Unavailable("LLM not configured".into()));
        }

        let prompt = build_trade_prompt(request);
        debug!(chars = prompt.len(), partners = request.partners.len(), "requesting trade advice");

        let reply = self
            .client
            .complete(&system_prompt(), &prompt, self.max_tokens, self.timeout)
            .await
            .map_err(|e| AdvisorError::Unavailable(format!("{e:#}")))?;

        if reply.trim().is_empty() {
            return Err(AdvisorError::Unparsable("empty reply".into()));
        }
        info!("Trade advice received ({} chars)", reply.len());
        Ok(reply)
    }
}
