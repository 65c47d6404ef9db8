//! Domain actions and their execution records.

use crate::semantics::proposition::Proposition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A domain action with declared pre- and postconditions.
///
/// The declared strings feed the domain model's fallback checks: a
/// precondition string must appear as a member (or prefix) of the
/// commitment set; a postcondition string parses as a canonical
/// `pred(k=v, ...)` proposition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub postconditions: Vec<String>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_precondition(mut self, condition: impl Into<String>) -> Self {
        self.preconditions.push(condition.into());
        self
    }

    pub fn with_postcondition(mut self, condition: impl Into<String>) -> Self {
        self.postconditions.push(condition.into());
        self
    }
}

/// Outcome of an externally executed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Succeeded,
    Failed,
}

/// Record of an action execution, stored in the information state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: String,
    pub status: ActionStatus,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub effects: Vec<Proposition>,
    #[serde(default)]
    pub timestamp: f64,
}

impl ActionRecord {
    pub fn succeeded(action: impl Into<String>, effects: Vec<Proposition>) -> Self {
        Self {
            action: action.into(),
            status: ActionStatus::Succeeded,
            detail: String::new(),
            effects,
            timestamp: 0.0,
        }
    }

    pub fn failed(action: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            status: ActionStatus::Failed,
            detail: reason.into(),
            effects: Vec::new(),
            timestamp: 0.0,
        }
    }
}
