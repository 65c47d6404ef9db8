//! Update rules and priority-ordered rule sets.

use crate::rules::context::TurnContext;
use ibis_domain::InformationState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// The four phases of the control loop a rule can belong to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RulePhase {
    Interpretation,
    Integration,
    Selection,
    Generation,
}

impl RulePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RulePhase::Interpretation => "interpretation",
            RulePhase::Integration => "integration",
            RulePhase::Selection => "selection",
            RulePhase::Generation => "generation",
        }
    }
}

impl std::fmt::Display for RulePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

type Precondition = Box<dyn Fn(&InformationState, &TurnContext) -> bool + Send + Sync>;
type Effect = Box<dyn Fn(&InformationState, &mut TurnContext) -> InformationState + Send + Sync>;

/// A precondition/effect pair with a name, phase, and priority.
///
/// Effects are pure with respect to the state: they receive a reference and
/// return a new value, mutating only the turn context.
pub struct UpdateRule {
    name: String,
    phase: RulePhase,
    priority: i32,
    preconditions: Precondition,
    effects: Effect,
}

impl UpdateRule {
    pub fn new<P, E>(name: impl Into<String>, phase: RulePhase, preconditions: P, effects: E) -> Self
    where
        P: Fn(&InformationState, &TurnContext) -> bool + Send + Sync + 'static,
        E: Fn(&InformationState, &mut TurnContext) -> InformationState + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            phase,
            priority: 0,
            preconditions: Box::new(preconditions),
            effects: Box::new(effects),
        }
    }

    /// Higher priorities run first.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> RulePhase {
        self.phase
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn applies(&self, state: &InformationState, context: &TurnContext) -> bool {
        (self.preconditions)(state, context)
    }

    pub fn apply(&self, state: &InformationState, context: &mut TurnContext) -> InformationState {
        (self.effects)(state, context)
    }
}

impl std::fmt::Debug for UpdateRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateRule")
            .field("name", &self.name)
            .field("phase", &self.phase)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Record of one rule's evaluation during a phase (for tracing surfaces).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub rule_name: String,
    pub priority: i32,
    pub preconditions_met: bool,
    pub was_selected: bool,
    #[serde(default)]
    pub reason: String,
}

/// Rules keyed by phase, each bucket ordered by descending priority.
///
/// Ties keep insertion order.
#[derive(Debug, Default)]
pub struct RuleSet {
    buckets: BTreeMap<RulePhase, Vec<UpdateRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule, keeping its phase bucket sorted by descending
    /// priority with stable ties.
    pub fn add_rule(&mut self, rule: UpdateRule) {
        let bucket = self.buckets.entry(rule.phase()).or_default();
        let position = bucket
            .iter()
            .position(|existing| existing.priority() < rule.priority())
            .unwrap_or(bucket.len());
        bucket.insert(position, rule);
    }

    /// Remove a rule by name, optionally within one phase. Returns whether
    /// anything was removed.
    pub fn remove_rule(&mut self, name: &str, phase: Option<RulePhase>) -> bool {
        let mut removed = false;
        for (bucket_phase, bucket) in self.buckets.iter_mut() {
            if phase.is_some_and(|p| p != *bucket_phase) {
                continue;
            }
            let before = bucket.len();
            bucket.retain(|rule| rule.name() != name);
            removed |= bucket.len() != before;
        }
        removed
    }

    pub fn get_rules(&self, phase: RulePhase) -> &[UpdateRule] {
        self.buckets.get(&phase).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear_rules(&mut self, phase: Option<RulePhase>) {
        match phase {
            Some(phase) => {
                self.buckets.remove(&phase);
            }
            None => self.buckets.clear(),
        }
    }

    pub fn rule_count(&self, phase: Option<RulePhase>) -> usize {
        match phase {
            Some(phase) => self.get_rules(phase).len(),
            None => self.buckets.values().map(Vec::len).sum(),
        }
    }

    /// Apply every rule whose preconditions hold at the moment it is
    /// reached, in priority order. Preconditions are re-checked against the
    /// evolving state, so a rule invalidated by an earlier firing is
    /// skipped.
    pub fn apply_rules(
        &self,
        phase: RulePhase,
        state: &InformationState,
        context: &mut TurnContext,
    ) -> InformationState {
        let (state, _evaluations) = self.apply_rules_logged(phase, state, context);
        state
    }

    /// [`apply_rules`](Self::apply_rules) with an evaluation record per
    /// rule, for rule-trace surfaces.
    pub fn apply_rules_logged(
        &self,
        phase: RulePhase,
        state: &InformationState,
        context: &mut TurnContext,
    ) -> (InformationState, Vec<RuleEvaluation>) {
        let mut current = state.clone();
        let mut evaluations = Vec::new();
        for rule in self.get_rules(phase) {
            let met = rule.applies(&current, context);
            trace!(rule = rule.name(), phase = %phase, met, "evaluated rule");
            if met {
                debug!(rule = rule.name(), phase = %phase, "applying rule");
                current = rule.apply(&current, context);
            }
            evaluations.push(RuleEvaluation {
                rule_name: rule.name().to_string(),
                priority: rule.priority(),
                preconditions_met: met,
                was_selected: met,
                reason: if met { "applied" } else { "preconditions not met" }.to_string(),
            });
        }
        (current, evaluations)
    }

    /// Apply only the highest-priority rule whose preconditions hold.
    /// Returns the original state (cloned) when nothing matches.
    pub fn apply_first_matching(
        &self,
        phase: RulePhase,
        state: &InformationState,
        context: &mut TurnContext,
    ) -> (InformationState, Option<String>) {
        let (state, evaluations) = self.apply_first_matching_logged(phase, state, context);
        let selected = evaluations
            .iter()
            .find(|e| e.was_selected)
            .map(|e| e.rule_name.clone());
        (state, selected)
    }

    /// [`apply_first_matching`](Self::apply_first_matching) with an
    /// evaluation record for every rule considered.
    pub fn apply_first_matching_logged(
        &self,
        phase: RulePhase,
        state: &InformationState,
        context: &mut TurnContext,
    ) -> (InformationState, Vec<RuleEvaluation>) {
        let mut evaluations = Vec::new();
        let mut result = None;
        for rule in self.get_rules(phase) {
            let met = rule.applies(state, context);
            if met && result.is_none() {
                debug!(rule = rule.name(), phase = %phase, "selected rule");
                result = Some(rule.apply(state, context));
                evaluations.push(RuleEvaluation {
                    rule_name: rule.name().to_string(),
                    priority: rule.priority(),
                    preconditions_met: true,
                    was_selected: true,
                    reason: "selected".to_string(),
                });
                break;
            }
            evaluations.push(RuleEvaluation {
                rule_name: rule.name().to_string(),
                priority: rule.priority(),
                preconditions_met: met,
                was_selected: false,
                reason: "preconditions not met".to_string(),
            });
        }
        (result.unwrap_or_else(|| state.clone()), evaluations)
    }
}
