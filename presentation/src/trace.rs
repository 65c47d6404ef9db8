//! Per-phase rule trace records.

use crate::diff::StateDiff;
use crate::snapshot::StateSnapshot;
use ibis_application::rules::update_rule::RuleEvaluation;
use serde::{Deserialize, Serialize};

/// What one phase did: which rules were considered, which fired, and how
/// the state changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTrace {
    pub phase: String,
    pub timestamp: u64,
    pub label: String,
    pub selected_rule: Option<String>,
    pub evaluations: Vec<RuleEvaluation>,
    pub state_before: StateSnapshot,
    pub state_after: StateSnapshot,
    pub diff: StateDiff,
}

impl RuleTrace {
    /// Build a trace from the phase's evaluation log and its before/after
    /// snapshots. The diff is computed here.
    pub fn new(
        phase: impl Into<String>,
        timestamp: u64,
        label: impl Into<String>,
        evaluations: Vec<RuleEvaluation>,
        state_before: StateSnapshot,
        state_after: StateSnapshot,
    ) -> Self {
        let selected_rule = evaluations
            .iter()
            .find(|e| e.was_selected)
            .map(|e| e.rule_name.clone());
        let diff = StateDiff::compute(state_before.clone(), state_after.clone());
        Self {
            phase: phase.into(),
            timestamp,
            label: label.into(),
            selected_rule,
            evaluations,
            state_before,
            state_after,
            diff,
        }
    }

    /// Names of all rules considered during the phase.
    pub fn rules_evaluated(&self) -> Vec<&str> {
        self.evaluations.iter().map(|e| e.rule_name.as_str()).collect()
    }

    /// Names of the rules whose preconditions held.
    pub fn rules_with_met_preconditions(&self) -> Vec<&str> {
        self.evaluations
            .iter()
            .filter(|e| e.preconditions_met)
            .map(|e| e.rule_name.as_str())
            .collect()
    }
}
