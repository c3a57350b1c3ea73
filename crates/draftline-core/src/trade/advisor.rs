// Seam for the narrative trade advisor (an LLM in production).
//
// Advice is best-effort: callers treat every error as "no narrative
// suggestions" and fall back to heuristic candidates.

use async_trait::async_trait;
use thiserror::Error;

use crate::analysis::roster::TeamAnalysis;
use crate::trade::compatibility::PartnerMatch;

/// Everything the advisor sees: my team and the shortlisted partners.
#[derive(Debug, Clone)]
pub struct AdviceRequest {
    pub mine: TeamAnalysis,
    pub partners: Vec<TeamAnalysis>,
    pub matches: Vec<PartnerMatch>,
    /// Suggestions wanted back.
    pub max_suggestions: usize,
}

impl AdviceRequest {
    pub fn partner(&self, team: u32) -> Option<&TeamAnalysis> {
        self.partners.iter().find(|p| p.team == team)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisorError {
    #[error("trade advisor unavailable: {0}")]
    Unavailable(String),

    #[error("trade advisor reply unusable: {0}")]
    Unparsable(String),
}

/// Produces raw trade ideas (JSON or prose) for an [`AdviceRequest`].
#[async_trait]
pub trait TradeAdvisor: Send + Sync {
    async fn advise(&self, request: &AdviceRequest) -> Result<String, AdvisorError>;
}

/// Advisor used when no LLM is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAdvisor;

#[async_trait]
impl TradeAdvisor for NoAdvisor {
    async fn advise(&self, _request: &AdviceRequest) -> Result<String, AdvisorError> {
        Err(AdvisorError::Unavailable("no advisor configured".into()))
    }
}
