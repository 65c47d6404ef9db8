//! Private (agent-internal) component of the information state.

use crate::model::action::ActionRecord;
use crate::semantics::content::ContentValue;
use crate::semantics::dialogue_move::DialogueMove;
use crate::semantics::plan::Plan;
use crate::semantics::proposition::Proposition;
use crate::semantics::question::Question;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Agent-internal beliefs, plans, and pending moves.
///
/// `issues` is the private findout queue (questions accommodated from plans
/// but not yet raised to QUD); `iun` holds alternatives under negotiation
/// that have been offered but neither accepted nor rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateIS {
    #[serde(default)]
    pub plan: Vec<Plan>,
    #[serde(default)]
    pub agenda: VecDeque<DialogueMove>,
    #[serde(default)]
    pub beliefs: BTreeMap<String, ContentValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_utterance: Option<DialogueMove>,
    #[serde(default)]
    pub issues: Vec<Question>,
    #[serde(default)]
    pub overridden_questions: Vec<Question>,
    #[serde(default)]
    pub iun: BTreeSet<Proposition>,
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

impl PrivateIS {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `question` is queued as a private issue.
    pub fn has_issue(&self, question: &Question) -> bool {
        self.issues.contains(question)
    }

    /// Remove `question` from the issue queue; true if it was present.
    pub fn remove_issue(&mut self, question: &Question) -> bool {
        if let Some(position) = self.issues.iter().position(|q| q == question) {
            self.issues.remove(position);
            true
        } else {
            false
        }
    }

    /// Retract a question from the issue queue into the overridden list.
    pub fn override_issue(&mut self, question: &Question) -> bool {
        if self.remove_issue(question) {
            self.overridden_questions.push(question.clone());
            true
        } else {
            false
        }
    }

    /// Mark the findout step for `question` completed across all plans.
    pub fn complete_findout_for(&mut self, question: &Question) -> bool {
        self.plan
            .iter_mut()
            .any(|plan| plan.complete_findout_for(question))
    }
}
