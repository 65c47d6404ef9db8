//! The dialogue move engine: interpret → integrate → select → generate.
//!
//! The engine is a pure function parameterized by an agent id and a rule
//! set. No method retains mutable state between calls; each phase seeds a
//! fresh [`TurnContext`], applies its rule bucket, and drops the context at
//! the phase boundary. The caller owns the information state and threads it
//! through the phases (see [`crate::pipeline`]).

use crate::ports::nlu::NluResult;
use crate::rules::context::TurnContext;
use crate::rules::standard::standard_rule_set;
use crate::rules::update_rule::{RulePhase, RuleSet};
use ibis_domain::{Answer, ContentValue, DialogueMove, DomainModel, InformationState, MoveType};
use std::sync::Arc;
use tracing::debug;

/// Orchestrates the four phases of the control loop.
pub struct DialogueMoveEngine {
    agent_id: String,
    rules: RuleSet,
}

impl DialogueMoveEngine {
    /// Create an engine with an explicit rule set.
    pub fn new(agent_id: impl Into<String>, rules: RuleSet) -> Self {
        Self {
            agent_id: agent_id.into(),
            rules,
        }
    }

    /// Create an engine running the standard rule library over a domain.
    pub fn with_domain(agent_id: impl Into<String>, domain: Arc<DomainModel>) -> Self {
        Self::new(agent_id, standard_rule_set(domain))
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleSet {
        &mut self.rules
    }

    /// Map an utterance to dialogue moves. Read-only on the caller's state;
    /// an empty utterance produces no moves.
    pub fn interpret(
        &self,
        utterance: &str,
        speaker: &str,
        state: &InformationState,
    ) -> Vec<DialogueMove> {
        if utterance.trim().is_empty() {
            return Vec::new();
        }
        let mut context = TurnContext::for_utterance(utterance, speaker);
        let _ = self
            .rules
            .apply_rules(RulePhase::Interpretation, state, &mut context);
        debug!(
            utterance,
            speaker,
            moves = context.produced_moves.len(),
            "interpreted utterance"
        );
        context.produced_moves
    }

    /// Construct moves directly from a structured NLU result (6-stage
    /// pipeline), bypassing the interpretation rules.
    pub fn interpret_from_nlu_result(
        &self,
        result: &NluResult,
        speaker: &str,
        state: &InformationState,
    ) -> Vec<DialogueMove> {
        let fallback_content = || {
            result
                .utterance
                .clone()
                .map(ContentValue::from)
                .unwrap_or_else(ContentValue::empty)
        };
        let dialogue_move = match result.dialogue_act {
            MoveType::Ask => result
                .question
                .clone()
                .map(|q| DialogueMove::new(MoveType::Ask, q, speaker)),
            MoveType::Answer => {
                let answer = result.answer.clone().or_else(|| {
                    result.utterance.as_ref().map(|u| {
                        let mut answer = Answer::new(u.clone());
                        if let Some(top) = state.shared.top_qud() {
                            answer = answer.for_question(top.clone());
                        }
                        answer
                    })
                });
                answer.map(|a| DialogueMove::new(MoveType::Answer, a, speaker))
            }
            // An NLU result has no grounding level/polarity; ICM moves must
            // be constructed by the host via the ICM factories.
            MoveType::Icm => None,
            act => Some(DialogueMove::new(act, fallback_content(), speaker)),
        };
        dialogue_move
            .map(|m| m.with_metadata("confidence", result.confidence))
            .into_iter()
            .collect()
    }

    /// Integrate one move. Pure: the caller's state is untouched.
    ///
    /// Whatever the move type, it enters the grounded history
    /// (`shared.moves`) and becomes the last utterance; the rules decide
    /// everything else.
    pub fn integrate(
        &self,
        dialogue_move: &DialogueMove,
        state: &InformationState,
    ) -> InformationState {
        let mut context = TurnContext::for_move(dialogue_move.clone());
        let mut new_state = self
            .rules
            .apply_rules(RulePhase::Integration, state, &mut context);
        new_state.shared.moves.push(dialogue_move.clone());
        new_state.private.last_utterance = Some(dialogue_move.clone());
        new_state
    }

    /// Select at most one response move.
    pub fn select_action(
        &self,
        state: &InformationState,
    ) -> (Option<DialogueMove>, InformationState) {
        let mut context = TurnContext::default();
        let (mut new_state, selected) =
            self.rules
                .apply_first_matching(RulePhase::Selection, state, &mut context);
        if let Some(response) = context.response_move.take() {
            return (Some(response), new_state);
        }
        if selected.is_some() {
            if let Some(response) = new_state.private.agenda.pop_front() {
                return (Some(response), new_state);
            }
        }
        (None, new_state)
    }

    /// Produce surface text for a move. Does not modify the state; the
    /// caller is responsible for integrating the agent's own move.
    pub fn generate(&self, dialogue_move: &DialogueMove, state: &InformationState) -> String {
        let mut context = TurnContext::for_generation(dialogue_move.clone());
        let _ = self
            .rules
            .apply_first_matching(RulePhase::Generation, state, &mut context);
        context
            .generated_text
            .unwrap_or_else(|| Self::default_generation(dialogue_move))
    }

    /// Template fallbacks per move type.
    fn default_generation(dialogue_move: &DialogueMove) -> String {
        let content = dialogue_move.content.to_string();
        match dialogue_move.move_type {
            MoveType::Greet => {
                if dialogue_move.content.as_text() == Some("greeting_response") {
                    "Hello! How can I help you today?".to_string()
                } else {
                    "Hello!".to_string()
                }
            }
            MoveType::Quit => "Goodbye!".to_string(),
            MoveType::Command => format!("I understand: {}", content),
            MoveType::Answer | MoveType::Assert => {
                if content.ends_with(['.', '!', '?']) {
                    content
                } else {
                    format!("{}.", content)
                }
            }
            MoveType::Ask => {
                if content.ends_with('?') {
                    content
                } else {
                    format!("{}?", content)
                }
            }
            _ => content,
        }
    }
}

impl std::fmt::Debug for DialogueMoveEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueMoveEngine")
            .field("agent_id", &self.agent_id)
            .field("rules", &self.rules.rule_count(None))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_domain::{Plan, Proposition, Question};

    /// NDA domain used by the end-to-end scenarios.
    fn nda_domain() -> Arc<DomainModel> {
        let mut domain = DomainModel::new("legal");
        domain.add_predicate(
            "legal_entities",
            1,
            vec![],
            "Which parties are entering into the NDA",
        );
        domain.add_predicate("effective_date", 1, vec![], "When the NDA takes effect");
        domain.add_predicate("duration", 1, vec![], "How long the NDA lasts");
        domain.add_task_trigger(
            "nda_drafting",
            vec!["draft an nda".to_string(), "draft nda".to_string()],
        );
        domain.register_plan_builder("nda_drafting", |_| {
            Plan::new("nda_drafting", "").with_subplans(vec![
                Plan::findout(Question::wh("parties", "legal_entities").unwrap()),
                Plan::findout(
                    Question::alt(vec!["mutual".to_string(), "one-way".to_string()]).unwrap(),
                ),
                Plan::findout(Question::wh("date", "effective_date").unwrap()),
                Plan::findout(Question::wh("length", "duration").unwrap()),
                Plan::findout(
                    Question::alt(vec!["California".to_string(), "Delaware".to_string()])
                        .unwrap(),
                ),
            ])
        });
        Arc::new(domain)
    }

    fn hotel_domain() -> Arc<DomainModel> {
        let mut domain = DomainModel::new("travel");
        domain.register_dominance_function("hotel", |a, b| {
            let price = |p: &Proposition| {
                p.arguments.get("price").and_then(|v| v.parse::<f64>().ok())
            };
            match (price(a), price(b)) {
                (Some(pa), Some(pb)) => pa < pb,
                _ => false,
            }
        });
        Arc::new(domain)
    }

    /// Run one full user turn: interpret, integrate each move, select, and
    /// generate + self-integrate the response the way the pipeline does.
    fn run_turn(
        engine: &DialogueMoveEngine,
        state: InformationState,
        utterance: &str,
    ) -> (InformationState, Option<String>) {
        let moves = engine.interpret(utterance, "user", &state);
        let mut state = moves
            .iter()
            .fold(state, |current, m| engine.integrate(m, &current));
        let (response, mut state) = engine.select_action(&state);
        match response {
            Some(mut response_move) => {
                let text = engine.generate(&response_move, &state);
                response_move.content = ContentValue::from(text.clone());
                state = engine.integrate(&response_move, &state);
                (state, Some(text))
            }
            None => (state, None),
        }
    }

    #[test]
    fn test_interpret_empty_utterance_is_silent() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let state = InformationState::new("system");
        assert!(engine.interpret("", "user", &state).is_empty());
        assert!(engine.interpret("   ", "user", &state).is_empty());
    }

    #[test]
    fn test_interpret_is_read_only() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let state = InformationState::new("system");
        let before = state.clone();
        let moves = engine.interpret("hello", "user", &state);
        assert_eq!(moves.len(), 1);
        assert_eq!(state, before);
    }

    #[test]
    fn test_interpret_yields_one_reading_per_utterance() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let mut state = InformationState::new("system");

        // Alt questions that also start with an auxiliary or wh-word get
        // the alt reading only
        let moves = engine.interpret("Is it California or Delaware?", "user", &state);
        assert_eq!(moves.len(), 1);
        assert!(moves[0]
            .content
            .as_question()
            .and_then(Question::alternatives)
            .is_some());

        let moves = engine.interpret("Which is better, California or Delaware?", "user", &state);
        assert_eq!(moves.len(), 1);
        assert!(moves[0]
            .content
            .as_question()
            .and_then(Question::alternatives)
            .is_some());

        // A greeting wrapped around content answers the open question; a
        // bare salutation stays a greeting
        state
            .shared
            .push_qud(Question::wh("parties", "legal_entities").unwrap());
        let moves = engine.interpret("hey, Acme Corp", "user", &state);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].move_type, MoveType::Answer);

        let moves = engine.interpret("hi there", "user", &state);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].move_type, MoveType::Greet);
    }

    #[test]
    fn test_integrate_grows_move_history() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let state = InformationState::new("system");
        let m = DialogueMove::new(MoveType::Greet, "hello", "user");
        let new_state = engine.integrate(&m, &state);
        assert_eq!(new_state.shared.moves.len(), 1);
        assert_eq!(new_state.private.last_utterance.as_ref(), Some(&m));
        // History is monotone
        assert!(new_state.shared.moves.starts_with(&state.shared.moves));
    }

    #[test]
    fn test_select_on_quiet_state_returns_nothing() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let state = InformationState::new("system");
        let (response, new_state) = engine.select_action(&state);
        assert!(response.is_none());
        assert_eq!(new_state, state);
    }

    #[test]
    fn test_greeting_turn() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let state = InformationState::new("system");
        let (state, reply) = run_turn(&engine, state, "hello");
        assert_eq!(reply.as_deref(), Some("Hello! How can I help you today?"));
        // Both the user's and the system's move are on the record
        assert_eq!(state.shared.moves.len(), 2);
        assert_eq!(state.control.next_speaker, "user");
    }

    #[test]
    fn test_quit_turn_ends_dialogue() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let state = InformationState::new("system");
        let (state, reply) = run_turn(&engine, state, "goodbye");
        assert_eq!(reply.as_deref(), Some("Goodbye!"));
        assert_eq!(
            state.control.dialogue_state,
            ibis_domain::DialogueState::Ended
        );
    }

    // S1: task plan formation from a drafting request.
    #[test]
    fn test_scenario_nda_task_plan_formation() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let state = InformationState::new("system");
        let (state, reply) = run_turn(&engine, state, "I need to draft an NDA");

        assert_eq!(state.private.plan.len(), 1);
        let plan = &state.private.plan[0];
        assert_eq!(plan.plan_type.task_name(), Some("nda_drafting"));
        assert_eq!(plan.subplans.len(), 5);

        let top = state.shared.top_qud().unwrap();
        assert_eq!(top.predicate(), Some("legal_entities"));
        assert_eq!(state.control.next_speaker, "system");

        let text = reply.unwrap();
        assert!(text.contains("NDA"));
        assert!(text.contains("parties"));
    }

    // S2: volunteered information resolves a private issue, not the QUD.
    #[test]
    fn test_scenario_volunteer_information() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let mut state = InformationState::new("system");
        let q_parties = Question::wh("parties", "legal_entities").unwrap();
        let q_date = Question::wh("date", "effective_date").unwrap();
        state.shared.push_qud(q_parties.clone());
        state.private.issues.push(q_date.clone());

        let answer = Answer::new("January 1, 2025").for_question(q_date.clone());
        let m = DialogueMove::new(MoveType::Answer, answer, "user");
        let state = engine.integrate(&m, &state);

        assert!(!state.private.issues.contains(&q_date));
        assert_eq!(state.shared.top_qud(), Some(&q_parties));
        assert!(state
            .shared
            .commitments
            .iter()
            .any(|c| c.starts_with("effective_date:") && c.contains("January 1, 2025")));
    }

    // S3: an invalid answer suspends the question under a clarification.
    #[test]
    fn test_scenario_clarification() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let mut state = InformationState::new("system");
        let q_law =
            Question::alt(vec!["California".to_string(), "Delaware".to_string()]).unwrap();
        state.shared.push_qud(q_law.clone());

        let m = DialogueMove::new(MoveType::Answer, Answer::new("blue"), "user");
        let state = engine.integrate(&m, &state);

        assert_eq!(state.shared.qud.len(), 2);
        let top = state.shared.top_qud().unwrap();
        assert!(top.is_clarification());
        assert_eq!(
            top.constraint("for_question").and_then(ContentValue::as_question),
            Some(&q_law)
        );
        assert_eq!(
            top.constraint("invalid_answer").and_then(ContentValue::as_text),
            Some("blue")
        );
    }

    // S4: asserting a specific IUN proposition commits only that one.
    #[test]
    fn test_scenario_negotiation_accept() {
        let engine = DialogueMoveEngine::with_domain("system", hotel_domain());
        let mut state = InformationState::new("system");
        let chosen = Proposition::new("hotel").arg("price", "150");
        let other = Proposition::new("hotel").arg("price", "250");
        state.private.iun.insert(chosen.clone());
        state.private.iun.insert(other.clone());

        let m = DialogueMove::new(MoveType::Assert, chosen.clone(), "user");
        let state = engine.integrate(&m, &state);

        assert!(state.shared.commitments.contains("hotel(price=150)"));
        assert!(!state.private.iun.contains(&chosen));
        assert!(state.private.iun.contains(&other));
    }

    // S5: a rejection with known alternatives yields a counter-proposal.
    #[test]
    fn test_scenario_counter_proposal() {
        let engine = DialogueMoveEngine::with_domain("system", hotel_domain());
        let mut state = InformationState::new("system");
        state.private.beliefs.insert(
            "alternatives".to_string(),
            ContentValue::List(vec![
                ContentValue::from(Proposition::new("hotel").arg("price", "120")),
                ContentValue::from(Proposition::new("hotel").arg("price", "180")),
            ]),
        );
        let rejected = Proposition::new("hotel").arg("price", "200");
        let no = DialogueMove::new(MoveType::Answer, Answer::new("no"), "user")
            .with_metadata("rejected_proposition", rejected.clone());
        let state = engine.integrate(&no, &state);

        let (response, _state) = engine.select_action(&state);
        let counter = response.unwrap();
        assert_eq!(counter.move_type, MoveType::Assert);
        assert_eq!(
            counter.metadata.get("counter_proposal").and_then(ContentValue::as_bool),
            Some(true)
        );
        let offered = counter.content.as_proposition().unwrap();
        assert!(hotel_domain().dominates(offered, &rejected));
    }

    // S6: ICM grounding moves survive integration and serialization.
    #[test]
    fn test_scenario_icm_recovery() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let state = InformationState::new("system");

        let garbled = DialogueMove::new(MoveType::Answer, Answer::new("[garbled]"), "user")
            .with_metadata("confidence", 0.2);
        let state = engine.integrate(&garbled, &state);

        let pardon = DialogueMove::icm_perception_negative("Pardon?", "system").with_target(0);
        let state = engine.integrate(&pardon, &state);

        let retry = DialogueMove::new(MoveType::Answer, Answer::new("Paris"), "user")
            .with_metadata("confidence", 0.95);
        let state = engine.integrate(&retry, &state);

        let heard = DialogueMove::icm_understanding_positive("Paris", "system").with_target(2);
        let state = engine.integrate(&heard, &state);

        let signatures: Vec<Option<String>> =
            state.shared.moves.iter().map(|m| m.icm_signature()).collect();
        assert_eq!(signatures[1].as_deref(), Some("per*neg"));
        assert_eq!(signatures[3].as_deref(), Some("und*pos"));

        let json = state.to_json().unwrap();
        let back = InformationState::from_json(&json).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.shared.moves[1].target_move_index, Some(0));
    }

    #[test]
    fn test_answer_order_commutes_for_distinct_issues() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let q_date = Question::wh("date", "effective_date").unwrap();
        let q_length = Question::wh("length", "duration").unwrap();

        let mut state = InformationState::new("system");
        state.private.issues = vec![q_date.clone(), q_length.clone()];

        let a_date = DialogueMove::new(
            MoveType::Answer,
            Answer::new("January 1, 2025").for_question(q_date),
            "user",
        );
        let a_length = DialogueMove::new(
            MoveType::Answer,
            Answer::new("two years").for_question(q_length),
            "user",
        );

        let one = engine.integrate(&a_length, &engine.integrate(&a_date, &state));
        let other = engine.integrate(&a_date, &engine.integrate(&a_length, &state));
        assert_eq!(one.shared.commitments, other.shared.commitments);
    }

    #[test]
    fn test_interpret_from_nlu_result_builds_typed_moves() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let mut state = InformationState::new("system");
        let q = Question::wh("x", "effective_date").unwrap();
        state.shared.push_qud(q.clone());

        let result = NluResult::new(MoveType::Answer, 0.95).with_utterance("January 1, 2025");
        let moves = engine.interpret_from_nlu_result(&result, "user", &state);
        assert_eq!(moves.len(), 1);
        let answer = moves[0].content.as_answer().unwrap();
        assert_eq!(answer.question_ref.as_ref(), Some(&q));
        assert_eq!(moves[0].confidence(), Some(0.95));

        let ask = NluResult::new(MoveType::Ask, 0.9)
            .with_question(Question::yn("is it mutual").unwrap());
        let moves = engine.interpret_from_nlu_result(&ask, "user", &state);
        assert_eq!(moves[0].move_type, MoveType::Ask);

        // An ICM act cannot be built without grounding fields
        let icm = NluResult::new(MoveType::Icm, 0.9);
        assert!(engine.interpret_from_nlu_result(&icm, "user", &state).is_empty());
    }

    #[test]
    fn test_default_generation_templates() {
        let quit = DialogueMove::new(MoveType::Quit, "quit_response", "system");
        assert_eq!(DialogueMoveEngine::default_generation(&quit), "Goodbye!");

        let command = DialogueMove::new(MoveType::Command, "draft it", "system");
        assert_eq!(
            DialogueMoveEngine::default_generation(&command),
            "I understand: draft it"
        );

        let answer = DialogueMove::new(MoveType::Answer, Answer::new("Paris"), "system");
        assert_eq!(DialogueMoveEngine::default_generation(&answer), "Paris.");

        let assert_move = DialogueMove::new(MoveType::Assert, "done!", "system");
        assert_eq!(DialogueMoveEngine::default_generation(&assert_move), "done!");
    }
}
