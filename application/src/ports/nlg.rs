//! NLG collaborator port.

use async_trait::async_trait;
use ibis_domain::{DialogueMove, InformationState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors an NLG collaborator can raise.
#[derive(Error, Debug)]
pub enum NlgError {
    #[error("NLG generation failed: {0}")]
    Generation(String),

    #[error("NLG engine unavailable: {0}")]
    Unavailable(String),
}

/// Structured NLG output for one move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NlgResult {
    pub utterance_text: String,
    pub strategy: String,
    #[serde(default)]
    pub generation_rule: String,
    #[serde(default)]
    pub tokens_used: u32,
    #[serde(default)]
    pub latency: f64,
}

impl NlgResult {
    pub fn new(utterance_text: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            utterance_text: utterance_text.into(),
            strategy: strategy.into(),
            generation_rule: String::new(),
            tokens_used: 0,
            latency: 0.0,
        }
    }

    pub fn with_generation_rule(mut self, rule: impl Into<String>) -> Self {
        self.generation_rule = rule.into();
        self
    }

    pub fn with_latency(mut self, latency: f64) -> Self {
        self.latency = latency;
        self
    }
}

/// NLG collaborator used by the 6-stage pipeline.
#[async_trait]
pub trait NlgPort: Send + Sync {
    /// Produce surface text for a move against the current state.
    async fn generate(
        &self,
        dialogue_move: &DialogueMove,
        state: &InformationState,
    ) -> Result<NlgResult, NlgError>;
}
