//! NLU collaborator port.
//!
//! An external NLU engine turns an utterance into a structured result
//! (dialogue act, confidence, optional question/answer readings, entities)
//! that the engine consumes without running its own interpretation rules.
//! The entity/reference context is threaded through the turn pipeline; the
//! kernel stores it but does not interpret it.

use async_trait::async_trait;
use ibis_domain::{Answer, InformationState, MoveType, Question};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors an NLU collaborator can raise.
#[derive(Error, Debug)]
pub enum NluError {
    #[error("NLU processing failed: {0}")]
    Processing(String),

    #[error("NLU engine unavailable: {0}")]
    Unavailable(String),
}

/// A mention of an entity in an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub mention_id: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_form: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Entity {
    pub fn new(
        text: impl Into<String>,
        entity_type: impl Into<String>,
        mention_id: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            text: text.into(),
            entity_type: entity_type.into(),
            mention_id: mention_id.into(),
            confidence,
            canonical_form: None,
            entity_id: None,
            properties: BTreeMap::new(),
        }
    }
}

/// Entity and reference bookkeeping threaded across turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NluContext {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub entity_mentions: BTreeMap<String, Entity>,
    #[serde(default)]
    pub reference_chains: BTreeMap<String, Vec<String>>,
}

impl NluContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new mention, updating the mention table and, when the
    /// entity has an id, its reference chain.
    pub fn record_mention(&mut self, entity: Entity) {
        self.entity_mentions
            .insert(entity.mention_id.clone(), entity.clone());
        if let Some(entity_id) = &entity.entity_id {
            self.reference_chains
                .entry(entity_id.clone())
                .or_default()
                .push(entity.mention_id.clone());
        }
        self.entities.push(entity);
    }
}

/// Structured NLU output for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NluResult {
    pub dialogue_act: MoveType,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Question>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Answer>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub latency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utterance: Option<String>,
}

impl NluResult {
    pub fn new(dialogue_act: MoveType, confidence: f64) -> Self {
        Self {
            dialogue_act,
            confidence,
            question: None,
            answer: None,
            entities: Vec::new(),
            latency: 0.0,
            utterance: None,
        }
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.question = Some(question);
        self
    }

    pub fn with_answer(mut self, answer: Answer) -> Self {
        self.answer = Some(answer);
        self
    }

    pub fn with_utterance(mut self, utterance: impl Into<String>) -> Self {
        self.utterance = Some(utterance.into());
        self
    }
}

/// NLU collaborator used by the 6-stage pipeline.
#[async_trait]
pub trait NluPort: Send + Sync {
    /// Process one utterance against the current state and entity context.
    async fn process(
        &self,
        utterance: &str,
        speaker: &str,
        state: &InformationState,
        context: &NluContext,
    ) -> Result<(NluResult, NluContext), NluError>;
}
