//! Rule-backed NLU adapter.
//!
//! Implements the NLU port with fast-path regex classification for common
//! utterances (greetings, farewells, acknowledgments, simple commands) and
//! heuristic dialogue-act classification mirroring the engine's
//! interpretation rules. Confidence is derived from the utterance
//! complexity profile; a simple entity pass records capitalized spans into
//! the threaded NLU context.

use crate::nlu::complexity::analyze_complexity;
use async_trait::async_trait;
use ibis_application::ports::nlu::{Entity, NluContext, NluError, NluPort, NluResult};
use ibis_domain::{Answer, InformationState, MoveType, Question};
use regex::Regex;
use std::time::Instant;
use tracing::debug;

/// Tunables for [`PatternNlu`].
#[derive(Debug, Clone)]
pub struct PatternNluConfig {
    /// Use the fast-path patterns for common utterances.
    pub enable_fast_path: bool,
    /// Confidence floor for complex utterances.
    pub min_confidence: f64,
    /// Confidence reported on a fast-path hit.
    pub fast_path_confidence: f64,
}

impl Default for PatternNluConfig {
    fn default() -> Self {
        Self {
            enable_fast_path: true,
            min_confidence: 0.3,
            fast_path_confidence: 0.95,
        }
    }
}

struct FastPaths {
    greeting: Vec<Regex>,
    farewell: Vec<Regex>,
    acknowledgment: Vec<Regex>,
    simple_command: Vec<Regex>,
}

impl FastPaths {
    fn compile() -> Self {
        let build = |patterns: &[&str]| {
            patterns
                .iter()
                .map(|p| Regex::new(p).expect("static pattern"))
                .collect()
        };
        Self {
            greeting: build(&[
                r"(?i)^(hi|hello|hey|greetings?)[\s!.]*$",
                r"(?i)^good\s+(morning|afternoon|evening)[\s!.]*$",
            ]),
            farewell: build(&[
                r"(?i)^(bye|goodbye|see you|farewell)[\s!.]*$",
                r"(?i)^(good\s*night|take care)[\s!.]*$",
            ]),
            acknowledgment: build(&[
                r"(?i)^(yes|yeah|yep|ok|okay|sure|alright)[\s!.]*$",
                r"(?i)^(no|nope|nah)[\s!.]*$",
            ]),
            simple_command: build(&[r"(?i)^(help|stop|quit|exit)[\s!.]*$"]),
        }
    }

    fn classify(&self, utterance: &str) -> Option<MoveType> {
        let hit = |patterns: &[Regex]| patterns.iter().any(|p| p.is_match(utterance));
        let lowered = utterance.to_lowercase();
        if hit(&self.greeting) {
            Some(MoveType::Greet)
        } else if hit(&self.farewell) {
            Some(MoveType::Quit)
        } else if hit(&self.acknowledgment) {
            Some(MoveType::Answer)
        } else if hit(&self.simple_command) {
            if lowered.contains("quit") || lowered.contains("exit") {
                Some(MoveType::Quit)
            } else {
                Some(MoveType::Command)
            }
        } else {
            None
        }
    }
}

/// Pattern-matching implementation of the NLU port.
pub struct PatternNlu {
    config: PatternNluConfig,
    fast_paths: FastPaths,
    alt_splitter: Regex,
}

impl PatternNlu {
    pub fn new(config: PatternNluConfig) -> Self {
        Self {
            config,
            fast_paths: FastPaths::compile(),
            alt_splitter: Regex::new(r"(?i)\s+or\s+").expect("static pattern"),
        }
    }

    fn classify_act(&self, utterance: &str, state: &InformationState) -> MoveType {
        let trimmed = utterance.trim();
        let lowered = trimmed.to_lowercase();

        if self.config.enable_fast_path {
            if let Some(act) = self.fast_paths.classify(trimmed) {
                return act;
            }
        }

        let wh_start = ["what", "where", "when", "who", "why", "how", "which"]
            .iter()
            .any(|wh| lowered.starts_with(&format!("{} ", wh)));
        if wh_start || trimmed.ends_with('?') {
            return MoveType::Ask;
        }
        if ["yes", "no", "yeah", "nope", "yep", "nah", "true", "false"]
            .contains(&lowered.as_str())
        {
            return MoveType::Answer;
        }
        if !state.shared.qud.is_empty() && lowered.split_whitespace().count() <= 20 {
            return MoveType::Answer;
        }
        if lowered.starts_with("please ")
            || lowered.contains("i need")
            || lowered.contains("i want")
        {
            return MoveType::Request;
        }
        MoveType::Assert
    }

    fn build_question(&self, utterance: &str) -> Option<Question> {
        let trimmed = utterance.trim();
        let body = trimmed.trim_end_matches('?').trim();
        if body.is_empty() {
            return None;
        }
        let lowered = body.to_lowercase();
        if lowered.contains(" or ") && trimmed.ends_with('?') {
            let alternatives: Vec<String> = self
                .alt_splitter
                .split(body)
                .map(|alt| alt.trim().to_string())
                .filter(|alt| !alt.is_empty())
                .collect();
            return Question::alt(alternatives).ok();
        }
        for wh in ["what", "where", "when", "who", "why", "how", "which"] {
            if lowered == wh || lowered.starts_with(&format!("{} ", wh)) {
                let predicate = body[wh.len()..].trim();
                let predicate = if predicate.is_empty() { wh } else { predicate };
                return Question::wh("x", predicate).ok();
            }
        }
        Question::yn(body).ok()
    }

    fn build_answer(&self, utterance: &str, state: &InformationState) -> Answer {
        let lowered = utterance.trim().to_lowercase();
        let mut answer = if ["yes", "yeah", "yep", "true"].contains(&lowered.as_str()) {
            Answer::new(true)
        } else if ["no", "nope", "nah", "false"].contains(&lowered.as_str()) {
            Answer::new(false)
        } else {
            Answer::new(utterance.trim().to_string())
        };
        if let Some(top) = state.shared.top_qud() {
            answer = answer.for_question(top.clone());
        }
        answer
    }

    /// Capitalized multi-token spans become named-entity mentions.
    fn extract_entities(&self, utterance: &str, context: &NluContext) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut span: Vec<&str> = Vec::new();
        let mut counter = context.entity_mentions.len();
        let mut tokens: Vec<&str> = utterance
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
            .collect();
        tokens.push(""); // sentinel to flush the last span
        for (index, token) in tokens.iter().enumerate() {
            let capitalized =
                token.chars().next().is_some_and(|c| c.is_uppercase()) && token.len() > 1;
            // Skip sentence-initial capitalization
            if capitalized && index > 0 {
                span.push(token);
                continue;
            }
            if span.len() > 1 || (span.len() == 1 && span[0].chars().all(char::is_alphabetic)) {
                counter += 1;
                entities.push(Entity::new(
                    span.join(" "),
                    "named_entity",
                    format!("m{}", counter),
                    0.7,
                ));
            }
            span.clear();
        }
        entities
    }
}

impl Default for PatternNlu {
    fn default() -> Self {
        Self::new(PatternNluConfig::default())
    }
}

#[async_trait]
impl NluPort for PatternNlu {
    async fn process(
        &self,
        utterance: &str,
        _speaker: &str,
        state: &InformationState,
        context: &NluContext,
    ) -> Result<(NluResult, NluContext), NluError> {
        let started = Instant::now();
        let trimmed = utterance.trim();
        if trimmed.is_empty() {
            return Err(NluError::Processing("empty utterance".to_string()));
        }

        let fast_path_hit = self.config.enable_fast_path
            && self.fast_paths.classify(trimmed).is_some();
        let act = self.classify_act(trimmed, state);
        let profile = analyze_complexity(trimmed);
        let confidence = if fast_path_hit {
            self.config.fast_path_confidence
        } else {
            (1.0 - profile.complexity_score * 0.5).max(self.config.min_confidence)
        };

        let mut result = NluResult::new(act, confidence).with_utterance(trimmed);
        match act {
            MoveType::Ask => {
                if let Some(question) = self.build_question(trimmed) {
                    result = result.with_question(question);
                }
            }
            MoveType::Answer => {
                result = result.with_answer(self.build_answer(trimmed, state));
            }
            _ => {}
        }

        let mut updated_context = context.clone();
        for entity in self.extract_entities(trimmed, context) {
            result.entities.push(entity.clone());
            updated_context.record_mention(entity);
        }

        result.latency = started.elapsed().as_secs_f64();
        debug!(act = %result.dialogue_act, confidence, fast_path_hit, "classified utterance");
        Ok((result, updated_context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> InformationState {
        InformationState::new("system")
    }

    #[tokio::test]
    async fn test_fast_path_greeting() {
        let nlu = PatternNlu::default();
        let (result, _) = nlu
            .process("Hello!", "user", &state(), &NluContext::new())
            .await
            .unwrap();
        assert_eq!(result.dialogue_act, MoveType::Greet);
        assert_eq!(result.confidence, 0.95);
    }

    #[tokio::test]
    async fn test_fast_path_farewell() {
        let nlu = PatternNlu::default();
        let (result, _) = nlu
            .process("goodbye", "user", &state(), &NluContext::new())
            .await
            .unwrap();
        assert_eq!(result.dialogue_act, MoveType::Quit);
    }

    #[tokio::test]
    async fn test_wh_question_reading() {
        let nlu = PatternNlu::default();
        let (result, _) = nlu
            .process("What is the duration?", "user", &state(), &NluContext::new())
            .await
            .unwrap();
        assert_eq!(result.dialogue_act, MoveType::Ask);
        let question = result.question.unwrap();
        assert_eq!(question.predicate(), Some("is the duration"));
    }

    #[tokio::test]
    async fn test_alt_question_reading() {
        let nlu = PatternNlu::default();
        let (result, _) = nlu
            .process("mutual or one-way?", "user", &state(), &NluContext::new())
            .await
            .unwrap();
        let question = result.question.unwrap();
        assert_eq!(question.alternatives().map(<[String]>::len), Some(2));
    }

    #[tokio::test]
    async fn test_answer_bound_to_open_question() {
        let nlu = PatternNlu::default();
        let mut state = state();
        let q = Question::wh("x", "effective_date").unwrap();
        state.shared.push_qud(q.clone());

        let (result, _) = nlu
            .process("January 1, 2025", "user", &state, &NluContext::new())
            .await
            .unwrap();
        assert_eq!(result.dialogue_act, MoveType::Answer);
        assert_eq!(result.answer.unwrap().question_ref, Some(q));
    }

    #[tokio::test]
    async fn test_yes_becomes_boolean_answer() {
        let nlu = PatternNlu::default();
        let (result, _) = nlu
            .process("yes", "user", &state(), &NluContext::new())
            .await
            .unwrap();
        assert_eq!(result.dialogue_act, MoveType::Answer);
        assert_eq!(
            result.answer.unwrap().content,
            ibis_domain::ContentValue::Bool(true)
        );
    }

    #[tokio::test]
    async fn test_request_classification() {
        let nlu = PatternNlu::default();
        let (result, _) = nlu
            .process(
                "I need to draft an NDA for my startup",
                "user",
                &state(),
                &NluContext::new(),
            )
            .await
            .unwrap();
        assert_eq!(result.dialogue_act, MoveType::Request);
    }

    #[tokio::test]
    async fn test_entities_recorded_in_context() {
        let nlu = PatternNlu::default();
        let (result, context) = nlu
            .process(
                "The parties are Acme Corp and Widgets Inc",
                "user",
                &state(),
                &NluContext::new(),
            )
            .await
            .unwrap();
        let texts: Vec<&str> = result.entities.iter().map(|e| e.text.as_str()).collect();
        assert!(texts.contains(&"Acme Corp"));
        assert!(texts.contains(&"Widgets Inc"));
        assert_eq!(context.entity_mentions.len(), result.entities.len());
    }

    #[tokio::test]
    async fn test_empty_utterance_is_an_error() {
        let nlu = PatternNlu::default();
        let result = nlu.process("  ", "user", &state(), &NluContext::new()).await;
        assert!(matches!(result, Err(NluError::Processing(_))));
    }

    #[tokio::test]
    async fn test_complex_utterance_lowers_confidence() {
        let nlu = PatternNlu::default();
        let (simple, _) = nlu
            .process("Paris", "user", &state(), &NluContext::new())
            .await
            .unwrap();
        let (complex, _) = nlu
            .process(
                "Well, they said it might not happen before next Tuesday, \
                 but after that they will probably try again with those partners",
                "user",
                &state(),
                &NluContext::new(),
            )
            .await
            .unwrap();
        assert!(complex.confidence < simple.confidence);
    }
}
