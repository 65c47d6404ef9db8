//! Explicit-state turn pipeline.
//!
//! Each phase of the control loop is a first-class *action* with a declared
//! read/write set over a serialized state bag. The information state is
//! stored in its canonical JSON form between actions and rehydrated inside
//! each one, so a host can checkpoint, inspect, or replay the bag at any
//! phase boundary. Engines and collaborators are process-local objects held
//! by reference.
//!
//! Two shapes: the 4-stage pipeline (`interpret → integrate → select →
//! generate`) when no collaborators are supplied, and the 6-stage pipeline
//! (`nlu → interpret → integrate → select → nlg → generate`) when external
//! NLU/NLG engines are plugged in. Failures inside an action are converted
//! into a failed [`ActionOutcome`]; the bag keeps the state as of the last
//! successful boundary.

use crate::engine::DialogueMoveEngine;
use crate::ports::event_log::{DialogueEvent, DialogueEventLog, NoDialogueEventLog};
use crate::ports::nlg::{NlgError, NlgPort, NlgResult};
use crate::ports::nlu::{NluContext, NluError, NluPort, NluResult};
use ibis_domain::{ContentValue, DialogueMove, InformationState};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors crossing an action boundary.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("State bag corrupted at '{key}': {detail}")]
    StateBag { key: &'static str, detail: String },

    #[error("NLU error: {0}")]
    Nlu(#[from] NluError),

    #[error("NLG error: {0}")]
    Nlg(#[from] NlgError),
}

/// Declared read/write set of one pipeline action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpec {
    pub name: &'static str,
    pub reads: &'static [&'static str],
    pub writes: &'static [&'static str],
}

pub const ACTION_INITIALIZE: ActionSpec = ActionSpec {
    name: "initialize",
    reads: &[],
    writes: &["information_state", "nlu_context", "ready"],
};

pub const ACTION_NLU: ActionSpec = ActionSpec {
    name: "nlu",
    reads: &["information_state", "nlu_context"],
    writes: &["utterance", "speaker", "nlu_result", "nlu_context"],
};

pub const ACTION_INTERPRET: ActionSpec = ActionSpec {
    name: "interpret",
    reads: &["nlu_result", "utterance", "speaker", "information_state"],
    writes: &["moves"],
};

pub const ACTION_INTEGRATE: ActionSpec = ActionSpec {
    name: "integrate",
    reads: &["moves", "information_state"],
    writes: &["information_state", "integrated"],
};

pub const ACTION_SELECT: ActionSpec = ActionSpec {
    name: "select",
    reads: &["information_state"],
    writes: &["information_state", "response_move", "has_response"],
};

pub const ACTION_NLG: ActionSpec = ActionSpec {
    name: "nlg",
    reads: &["response_move", "information_state"],
    writes: &["nlg_result"],
};

pub const ACTION_GENERATE: ActionSpec = ActionSpec {
    name: "generate",
    reads: &["response_move", "nlg_result", "information_state"],
    writes: &["information_state", "utterance_text"],
};

/// The serialized state threaded between actions.
#[derive(Debug, Clone, Default)]
pub struct StateBag {
    pub information_state: Value,
    pub nlu_context: Value,
    pub utterance: Option<String>,
    pub speaker: Option<String>,
    pub nlu_result: Option<Value>,
    pub moves: Vec<Value>,
    pub response_move: Option<Value>,
    pub nlg_result: Option<Value>,
    pub utterance_text: Option<String>,
    pub has_response: bool,
    pub integrated: bool,
    pub ready: bool,
}

/// Result status of one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
}

/// What one action did.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub action: &'static str,
    pub status: OutcomeStatus,
    pub detail: String,
}

impl ActionOutcome {
    fn succeeded(action: &'static str, detail: impl Into<String>) -> Self {
        Self {
            action,
            status: OutcomeStatus::Succeeded,
            detail: detail.into(),
        }
    }

    fn failed(action: &'static str, detail: impl Into<String>) -> Self {
        Self {
            action,
            status: OutcomeStatus::Failed,
            detail: detail.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

/// Everything a host needs from one processed turn.
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    pub moves: Vec<DialogueMove>,
    pub response_move: Option<DialogueMove>,
    pub utterance_text: String,
    pub has_response: bool,
    pub actions: Vec<ActionOutcome>,
}

impl TurnOutcome {
    pub fn succeeded(&self) -> bool {
        self.actions.iter().all(|a| !a.is_failure())
    }
}

type Clock = Arc<dyn Fn() -> f64 + Send + Sync>;

/// Drives the engine through the 4- or 6-stage pipeline.
pub struct DialoguePipeline {
    engine: DialogueMoveEngine,
    nlu_engine: Option<Arc<dyn NluPort>>,
    nlg_engine: Option<Arc<dyn NlgPort>>,
    event_log: Arc<dyn DialogueEventLog>,
    clock: Option<Clock>,
    bag: StateBag,
}

impl DialoguePipeline {
    /// Create and initialize a 4-stage pipeline.
    pub fn new(engine: DialogueMoveEngine) -> Self {
        let mut pipeline = Self {
            engine,
            nlu_engine: None,
            nlg_engine: None,
            event_log: Arc::new(NoDialogueEventLog),
            clock: None,
            bag: StateBag::default(),
        };
        pipeline.initialize();
        pipeline
    }

    /// Plug in an external NLU collaborator (enables the 6-stage shape).
    pub fn with_nlu(mut self, nlu_engine: Arc<dyn NluPort>) -> Self {
        self.nlu_engine = Some(nlu_engine);
        self
    }

    /// Plug in an external NLG collaborator.
    pub fn with_nlg(mut self, nlg_engine: Arc<dyn NlgPort>) -> Self {
        self.nlg_engine = Some(nlg_engine);
        self
    }

    /// Attach a dialogue event sink.
    pub fn with_event_log(mut self, event_log: Arc<dyn DialogueEventLog>) -> Self {
        self.event_log = event_log;
        self
    }

    /// Supply a clock used to stamp interpreted moves. Without one, move
    /// timestamps stay at zero and turns are fully deterministic.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn engine(&self) -> &DialogueMoveEngine {
        &self.engine
    }

    pub fn bag(&self) -> &StateBag {
        &self.bag
    }

    pub fn is_ready(&self) -> bool {
        self.bag.ready
    }

    /// Rehydrate the current information state from the bag.
    pub fn information_state(&self) -> Result<InformationState, PipelineError> {
        serde_json::from_value(self.bag.information_state.clone()).map_err(|e| {
            PipelineError::StateBag {
                key: "information_state",
                detail: e.to_string(),
            }
        })
    }

    /// Rehydrate the NLU context from the bag.
    pub fn nlu_context(&self) -> Result<NluContext, PipelineError> {
        serde_json::from_value(self.bag.nlu_context.clone()).map_err(|e| {
            PipelineError::StateBag {
                key: "nlu_context",
                detail: e.to_string(),
            }
        })
    }

    /// Discard all history and re-run initialization.
    pub fn reset(&mut self) {
        info!(agent_id = self.engine.agent_id(), "resetting dialogue pipeline");
        self.bag = StateBag::default();
        self.initialize();
    }

    fn initialize(&mut self) -> ActionOutcome {
        let state = InformationState::new(self.engine.agent_id());
        let context = NluContext::new();
        match (serde_json::to_value(&state), serde_json::to_value(&context)) {
            (Ok(state_value), Ok(context_value)) => {
                self.bag.information_state = state_value;
                self.bag.nlu_context = context_value;
                self.bag.ready = true;
                info!(agent_id = self.engine.agent_id(), "pipeline initialized");
                ActionOutcome::succeeded(ACTION_INITIALIZE.name, "ready")
            }
            (Err(e), _) | (_, Err(e)) => {
                ActionOutcome::failed(ACTION_INITIALIZE.name, e.to_string())
            }
        }
    }

    fn clear_turn_scratch(&mut self) {
        self.bag.utterance = None;
        self.bag.speaker = None;
        self.bag.nlu_result = None;
        self.bag.moves.clear();
        self.bag.response_move = None;
        self.bag.nlg_result = None;
        self.bag.utterance_text = None;
        self.bag.has_response = false;
        self.bag.integrated = false;
    }

    /// Process one user turn through the 4- or 6-stage pipeline.
    ///
    /// Never panics or bubbles collaborator failures: each action reports
    /// an [`ActionOutcome`], and a failure stops the turn at that boundary
    /// with the state as of the previous one.
    pub async fn process_turn(&mut self, utterance: &str, speaker: &str) -> TurnOutcome {
        let mut outcome = TurnOutcome::default();
        self.clear_turn_scratch();

        // nlu (6-stage only)
        if self.nlu_engine.is_some() {
            match self.action_nlu(utterance, speaker).await {
                Ok(action) => outcome.actions.push(action),
                Err(error) => {
                    outcome
                        .actions
                        .push(ActionOutcome::failed(ACTION_NLU.name, error.to_string()));
                    return outcome;
                }
            }
        } else {
            self.bag.utterance = Some(utterance.to_string());
            self.bag.speaker = Some(speaker.to_string());
        }

        // interpret
        match self.action_interpret() {
            Ok((action, moves)) => {
                outcome.actions.push(action);
                outcome.moves = moves;
            }
            Err(error) => {
                outcome
                    .actions
                    .push(ActionOutcome::failed(ACTION_INTERPRET.name, error.to_string()));
                return outcome;
            }
        }

        // integrate
        match self.action_integrate(&outcome.moves) {
            Ok(action) => outcome.actions.push(action),
            Err(error) => {
                outcome
                    .actions
                    .push(ActionOutcome::failed(ACTION_INTEGRATE.name, error.to_string()));
                return outcome;
            }
        }

        // select
        match self.action_select() {
            Ok((action, response)) => {
                outcome.actions.push(action);
                outcome.has_response = response.is_some();
                outcome.response_move = response;
            }
            Err(error) => {
                outcome
                    .actions
                    .push(ActionOutcome::failed(ACTION_SELECT.name, error.to_string()));
                return outcome;
            }
        }

        // nlg (6-stage only, and only when there is something to say)
        if self.nlg_engine.is_some() && outcome.response_move.is_some() {
            match self.action_nlg(outcome.response_move.as_ref()).await {
                Ok(action) => outcome.actions.push(action),
                Err(error) => {
                    outcome
                        .actions
                        .push(ActionOutcome::failed(ACTION_NLG.name, error.to_string()));
                    return outcome;
                }
            }
        }

        // generate
        match self.action_generate(outcome.response_move.clone()) {
            Ok((action, text, integrated_move)) => {
                outcome.actions.push(action);
                outcome.utterance_text = text;
                if let Some(integrated_move) = integrated_move {
                    outcome.response_move = Some(integrated_move);
                }
            }
            Err(error) => {
                outcome
                    .actions
                    .push(ActionOutcome::failed(ACTION_GENERATE.name, error.to_string()));
                return outcome;
            }
        }

        self.event_log.log(DialogueEvent::new(
            "turn",
            serde_json::json!({
                "utterance": utterance,
                "speaker": speaker,
                "moves": outcome.moves.len(),
                "response": outcome.utterance_text,
                "has_response": outcome.has_response,
            }),
        ));
        outcome
    }

    async fn action_nlu(
        &mut self,
        utterance: &str,
        speaker: &str,
    ) -> Result<ActionOutcome, PipelineError> {
        let Some(nlu_engine) = self.nlu_engine.clone() else {
            return Ok(ActionOutcome::succeeded(ACTION_NLU.name, "skipped"));
        };
        let state = self.information_state()?;
        let context = self.nlu_context()?;
        let (result, updated_context) = nlu_engine
            .process(utterance, speaker, &state, &context)
            .await?;
        debug!(
            dialogue_act = %result.dialogue_act,
            confidence = result.confidence,
            "nlu processed utterance"
        );
        self.bag.utterance = Some(utterance.to_string());
        self.bag.speaker = Some(speaker.to_string());
        self.bag.nlu_result = Some(to_bag_value("nlu_result", &result)?);
        self.bag.nlu_context = to_bag_value("nlu_context", &updated_context)?;
        Ok(ActionOutcome::succeeded(
            ACTION_NLU.name,
            format!("act={} confidence={:.2}", result.dialogue_act, result.confidence),
        ))
    }

    fn action_interpret(&mut self) -> Result<(ActionOutcome, Vec<DialogueMove>), PipelineError> {
        let state = self.information_state()?;
        let speaker = self.bag.speaker.clone().unwrap_or_else(|| "user".to_string());
        let mut moves = match &self.bag.nlu_result {
            Some(value) => {
                let result: NluResult = from_bag_value("nlu_result", value)?;
                self.engine.interpret_from_nlu_result(&result, &speaker, &state)
            }
            None => {
                let utterance = self.bag.utterance.clone().unwrap_or_default();
                self.engine.interpret(&utterance, &speaker, &state)
            }
        };
        if let Some(clock) = &self.clock {
            let now = clock();
            for dialogue_move in &mut moves {
                dialogue_move.timestamp = now;
            }
        }
        self.bag.moves = moves
            .iter()
            .map(|m| to_bag_value("moves", m))
            .collect::<Result<_, _>>()?;
        Ok((
            ActionOutcome::succeeded(ACTION_INTERPRET.name, format!("{} moves", moves.len())),
            moves,
        ))
    }

    fn action_integrate(&mut self, moves: &[DialogueMove]) -> Result<ActionOutcome, PipelineError> {
        let mut state = self.information_state()?;
        for dialogue_move in moves {
            state = self.engine.integrate(dialogue_move, &state);
        }
        self.bag.information_state = to_bag_value("information_state", &state)?;
        self.bag.integrated = true;
        Ok(ActionOutcome::succeeded(
            ACTION_INTEGRATE.name,
            format!("{} moves", moves.len()),
        ))
    }

    fn action_select(&mut self) -> Result<(ActionOutcome, Option<DialogueMove>), PipelineError> {
        let state = self.information_state()?;
        if state.control.next_speaker != self.engine.agent_id() {
            self.bag.has_response = false;
            self.bag.response_move = None;
            return Ok((
                ActionOutcome::succeeded(ACTION_SELECT.name, "not our turn"),
                None,
            ));
        }
        let (response, new_state) = self.engine.select_action(&state);
        self.bag.information_state = to_bag_value("information_state", &new_state)?;
        self.bag.has_response = response.is_some();
        self.bag.response_move = response
            .as_ref()
            .map(|m| to_bag_value("response_move", m))
            .transpose()?;
        let detail = match &response {
            Some(m) => format!("selected {}", m.move_type),
            None => "no move".to_string(),
        };
        Ok((ActionOutcome::succeeded(ACTION_SELECT.name, detail), response))
    }

    async fn action_nlg(
        &mut self,
        response: Option<&DialogueMove>,
    ) -> Result<ActionOutcome, PipelineError> {
        let (Some(nlg_engine), Some(response)) = (self.nlg_engine.clone(), response) else {
            return Ok(ActionOutcome::succeeded(ACTION_NLG.name, "skipped"));
        };
        let state = self.information_state()?;
        let result = nlg_engine.generate(response, &state).await?;
        debug!(strategy = %result.strategy, "nlg generated text");
        self.bag.nlg_result = Some(to_bag_value("nlg_result", &result)?);
        Ok(ActionOutcome::succeeded(
            ACTION_NLG.name,
            format!("strategy={}", result.strategy),
        ))
    }

    fn action_generate(
        &mut self,
        response: Option<DialogueMove>,
    ) -> Result<(ActionOutcome, String, Option<DialogueMove>), PipelineError> {
        let Some(mut response_move) = response else {
            self.bag.utterance_text = Some(String::new());
            return Ok((
                ActionOutcome::succeeded(ACTION_GENERATE.name, "nothing to say"),
                String::new(),
                None,
            ));
        };
        let state = self.information_state()?;
        // An NLG result wins over the engine's template generation.
        let text = match &self.bag.nlg_result {
            Some(value) => {
                let result: NlgResult = from_bag_value("nlg_result", value)?;
                result.utterance_text
            }
            None => self.engine.generate(&response_move, &state),
        };
        // The uttered move carries its surface form and is integrated as
        // the agent's own contribution.
        response_move.content = ContentValue::from(text.clone());
        let new_state = self.engine.integrate(&response_move, &state);
        self.bag.information_state = to_bag_value("information_state", &new_state)?;
        self.bag.utterance_text = Some(text.clone());
        self.bag.response_move = Some(to_bag_value("response_move", &response_move)?);
        Ok((
            ActionOutcome::succeeded(ACTION_GENERATE.name, format!("{} chars", text.len())),
            text,
            Some(response_move),
        ))
    }
}

fn to_bag_value<T: serde::Serialize>(
    key: &'static str,
    value: &T,
) -> Result<Value, PipelineError> {
    serde_json::to_value(value).map_err(|e| PipelineError::StateBag {
        key,
        detail: e.to_string(),
    })
}

fn from_bag_value<T: serde::de::DeserializeOwned>(
    key: &'static str,
    value: &Value,
) -> Result<T, PipelineError> {
    serde_json::from_value(value.clone()).map_err(|e| PipelineError::StateBag {
        key,
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ibis_domain::{Answer, DomainModel, MoveType, Plan, Question};
    use std::sync::Mutex;

    fn nda_domain() -> Arc<DomainModel> {
        let mut domain = DomainModel::new("legal");
        domain.add_predicate(
            "legal_entities",
            1,
            vec![],
            "Which parties are entering into the NDA",
        );
        domain.add_predicate("effective_date", 1, vec![], "When the NDA takes effect");
        domain.add_task_trigger("nda_drafting", vec!["draft an nda".to_string()]);
        domain.register_plan_builder("nda_drafting", |_| {
            Plan::new("nda_drafting", "").with_subplans(vec![
                Plan::findout(Question::wh("parties", "legal_entities").unwrap()),
                Plan::findout(Question::wh("date", "effective_date").unwrap()),
            ])
        });
        Arc::new(domain)
    }

    fn pipeline() -> DialoguePipeline {
        DialoguePipeline::new(DialogueMoveEngine::with_domain("system", nda_domain()))
    }

    /// Canned NLU that always reports an answer act.
    struct CannedNlu;

    #[async_trait]
    impl NluPort for CannedNlu {
        async fn process(
            &self,
            utterance: &str,
            _speaker: &str,
            state: &InformationState,
            context: &NluContext,
        ) -> Result<(NluResult, NluContext), NluError> {
            let mut answer = Answer::new(utterance.to_string());
            if let Some(top) = state.shared.top_qud() {
                answer = answer.for_question(top.clone());
            }
            let result = NluResult::new(MoveType::Answer, 0.9)
                .with_answer(answer)
                .with_utterance(utterance);
            Ok((result, context.clone()))
        }
    }

    struct FailingNlu;

    #[async_trait]
    impl NluPort for FailingNlu {
        async fn process(
            &self,
            _utterance: &str,
            _speaker: &str,
            _state: &InformationState,
            _context: &NluContext,
        ) -> Result<(NluResult, NluContext), NluError> {
            Err(NluError::Unavailable("model offline".to_string()))
        }
    }

    /// Canned NLG that surfaces a fixed string.
    struct CannedNlg;

    #[async_trait]
    impl NlgPort for CannedNlg {
        async fn generate(
            &self,
            _dialogue_move: &DialogueMove,
            _state: &InformationState,
        ) -> Result<NlgResult, NlgError> {
            Ok(NlgResult::new("canned response", "canned"))
        }
    }

    struct Recorder(Mutex<Vec<String>>);

    impl DialogueEventLog for Recorder {
        fn log(&self, event: DialogueEvent) {
            self.0.lock().unwrap().push(event.event_type);
        }
    }

    #[test]
    fn test_initialize_marks_ready() {
        let pipeline = pipeline();
        assert!(pipeline.is_ready());
        let state = pipeline.information_state().unwrap();
        assert_eq!(state.agent_id, "system");
        assert!(state.shared.moves.is_empty());
    }

    #[tokio::test]
    async fn test_four_stage_greeting_turn() {
        let mut pipeline = pipeline();
        let outcome = pipeline.process_turn("hello", "user").await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.moves.len(), 1);
        assert!(outcome.has_response);
        assert_eq!(outcome.utterance_text, "Hello! How can I help you today?");

        // 4-stage shape: interpret, integrate, select, generate
        let names: Vec<&str> = outcome.actions.iter().map(|a| a.action).collect();
        assert_eq!(names, vec!["interpret", "integrate", "select", "generate"]);

        let state = pipeline.information_state().unwrap();
        assert_eq!(state.shared.moves.len(), 2);
    }

    #[tokio::test]
    async fn test_four_stage_nda_task_turn() {
        let mut pipeline = pipeline();
        let outcome = pipeline.process_turn("I need to draft an NDA", "user").await;

        assert!(outcome.succeeded());
        let text = outcome.utterance_text;
        assert!(text.contains("NDA"));
        assert!(text.contains("parties"));

        let state = pipeline.information_state().unwrap();
        assert_eq!(state.private.plan.len(), 1);
        assert_eq!(
            state.shared.top_qud().and_then(Question::predicate),
            Some("legal_entities")
        );

        // Second turn: answering advances the plan
        let outcome = pipeline.process_turn("Acme Corp and Widgets Inc", "user").await;
        assert!(outcome.succeeded());
        let state = pipeline.information_state().unwrap();
        assert!(state
            .shared
            .commitments
            .contains("legal_entities: Acme Corp and Widgets Inc"));
    }

    #[tokio::test]
    async fn test_full_nda_dialogue() {
        let mut domain = DomainModel::new("legal");
        domain.add_predicate(
            "legal_entities",
            1,
            vec![],
            "Which parties are entering into the NDA",
        );
        domain.add_predicate("effective_date", 1, vec![], "When the NDA takes effect");
        domain.add_predicate("duration", 1, vec![], "How long the NDA lasts");
        domain.add_task_trigger("nda_drafting", vec!["draft an nda".to_string()]);
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
        let engine = DialogueMoveEngine::with_domain("system", Arc::new(domain));
        let mut pipeline = DialoguePipeline::new(engine);

        let outcome = pipeline.process_turn("hello", "user").await;
        assert_eq!(outcome.utterance_text, "Hello! How can I help you today?");

        let outcome = pipeline.process_turn("I need to draft an NDA", "user").await;
        assert!(outcome.utterance_text.starts_with("[Step 1 of 5]"));

        let outcome = pipeline
            .process_turn("Acme Corp and Widgets Inc", "user")
            .await;
        assert!(outcome.utterance_text.starts_with("[Step 2 of 5]"));

        let outcome = pipeline.process_turn("mutual", "user").await;
        assert!(outcome.utterance_text.starts_with("[Step 3 of 5]"));

        let outcome = pipeline.process_turn("January 1, 2025", "user").await;
        assert!(outcome.utterance_text.starts_with("[Step 4 of 5]"));

        let outcome = pipeline.process_turn("two years", "user").await;
        assert!(outcome.utterance_text.starts_with("[Step 5 of 5]"));

        // An invalid answer to the governing-law question is clarified
        let outcome = pipeline.process_turn("blue", "user").await;
        assert!(outcome.utterance_text.contains("'blue' is not a valid answer"));
        assert!(outcome.utterance_text.contains("California, Delaware"));

        // Answering the clarification repairs the original question
        let outcome = pipeline.process_turn("Delaware", "user").await;
        assert!(outcome.succeeded());
        assert!(!outcome.has_response);

        let state = pipeline.information_state().unwrap();
        assert!(state.shared.qud.is_empty());
        assert!(state.private.issues.is_empty());
        assert_eq!(state.private.plan[0].subplan_progress(), (5, 5));
        for expected in [
            "legal_entities: Acme Corp and Widgets Inc",
            "mutual|one-way: mutual",
            "effective_date: January 1, 2025",
            "duration: two years",
            "California|Delaware: Delaware",
        ] {
            assert!(
                state.shared.commitments.contains(expected),
                "missing commitment: {}",
                expected
            );
        }

        let outcome = pipeline.process_turn("goodbye", "user").await;
        assert_eq!(outcome.utterance_text, "Goodbye!");
        assert_eq!(
            pipeline.information_state().unwrap().control.dialogue_state,
            ibis_domain::DialogueState::Ended
        );
    }

    #[tokio::test]
    async fn test_six_stage_uses_nlu_and_nlg() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let mut pipeline = DialoguePipeline::new(engine)
            .with_nlu(Arc::new(CannedNlu))
            .with_nlg(Arc::new(CannedNlg));

        // Seed a question so the canned answer resolves something
        let mut state = pipeline.information_state().unwrap();
        let q = Question::wh("x", "effective_date").unwrap();
        state.shared.push_qud(q);
        state.control.next_speaker = "system".to_string();
        state
            .private
            .agenda
            .push_back(DialogueMove::new(MoveType::Greet, "greeting_response", "system"));
        pipeline.bag.information_state = serde_json::to_value(&state).unwrap();

        let outcome = pipeline.process_turn("January 1, 2025", "user").await;
        assert!(outcome.succeeded());

        // 6-stage shape (nlg runs because a response was selected)
        let names: Vec<&str> = outcome.actions.iter().map(|a| a.action).collect();
        assert_eq!(
            names,
            vec!["nlu", "interpret", "integrate", "select", "nlg", "generate"]
        );

        // The NLG result wins over template generation
        assert_eq!(outcome.utterance_text, "canned response");

        let state = pipeline.information_state().unwrap();
        assert!(state
            .shared
            .commitments
            .iter()
            .any(|c| c.contains("January 1, 2025")));
    }

    #[tokio::test]
    async fn test_nlu_failure_stops_turn_at_boundary() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let mut pipeline = DialoguePipeline::new(engine).with_nlu(Arc::new(FailingNlu));
        let before = pipeline.information_state().unwrap();

        let outcome = pipeline.process_turn("hello", "user").await;
        assert!(!outcome.succeeded());
        assert_eq!(outcome.actions.len(), 1);
        assert!(outcome.actions[0].is_failure());
        assert!(outcome.actions[0].detail.contains("model offline"));

        // State untouched at the failed boundary
        assert_eq!(pipeline.information_state().unwrap(), before);
    }

    #[tokio::test]
    async fn test_reset_discards_history() {
        let mut pipeline = pipeline();
        let _ = pipeline.process_turn("hello", "user").await;
        assert!(!pipeline.information_state().unwrap().shared.moves.is_empty());

        pipeline.reset();
        assert!(pipeline.is_ready());
        assert!(pipeline.information_state().unwrap().shared.moves.is_empty());
    }

    #[tokio::test]
    async fn test_event_log_receives_turn_events() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let mut pipeline = DialoguePipeline::new(engine).with_event_log(recorder.clone());

        let _ = pipeline.process_turn("hello", "user").await;
        assert_eq!(*recorder.0.lock().unwrap(), vec!["turn".to_string()]);
    }

    #[tokio::test]
    async fn test_clock_stamps_moves() {
        let engine = DialogueMoveEngine::with_domain("system", nda_domain());
        let mut pipeline = DialoguePipeline::new(engine).with_clock(Arc::new(|| 42.5));
        let outcome = pipeline.process_turn("hello", "user").await;
        assert_eq!(outcome.moves[0].timestamp, 42.5);
    }

    #[test]
    fn test_action_specs_declare_read_write_sets() {
        assert!(ACTION_NLU.writes.contains(&"nlu_result"));
        assert!(ACTION_INTERPRET.reads.contains(&"information_state"));
        assert!(ACTION_GENERATE.writes.contains(&"utterance_text"));
        assert!(ACTION_INITIALIZE.reads.is_empty());
    }
}
