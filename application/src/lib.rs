//! Application layer for ibis-dialogue
//!
//! This crate contains the rule engine (update rules and priority-ordered
//! rule sets), the standard rule library implementing Larsson's update and
//! selection algorithms, the dialogue move engine that drives the
//! interpret → integrate → select → generate loop, the explicit-state turn
//! pipeline, state-side domain action execution, and the ports for
//! external NLU/NLG collaborators.

pub mod engine;
pub mod execution;
pub mod pipeline;
pub mod ports;
pub mod rules;

// Re-export commonly used types
pub use engine::DialogueMoveEngine;
pub use execution::ExecutionController;
pub use pipeline::{
    ActionOutcome, ActionSpec, DialoguePipeline, OutcomeStatus, PipelineError, StateBag,
    TurnOutcome,
};
pub use ports::{
    event_log::{DialogueEvent, DialogueEventLog, NoDialogueEventLog},
    nlg::{NlgError, NlgPort, NlgResult},
    nlu::{Entity, NluContext, NluError, NluPort, NluResult},
};
pub use rules::{
    context::TurnContext,
    standard::standard_rule_set,
    update_rule::{RuleEvaluation, RulePhase, RuleSet, UpdateRule},
};
