//! Tripartite information state.
//!
//! The state is a plain value: cloning yields a fully independent copy,
//! equality is structural, and the JSON form round-trips losslessly. The
//! engine's phases take a state and return a new one; nothing here is
//! shared or locked.

pub mod control;
pub mod private;
pub mod shared;

use crate::core::error::DomainError;
use control::ControlIS;
use private::PrivateIS;
use serde::{Deserialize, Serialize};
use shared::SharedIS;

/// The complete information state of one dialogue agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationState {
    pub agent_id: String,
    #[serde(default)]
    pub private: PrivateIS,
    #[serde(default)]
    pub shared: SharedIS,
    #[serde(default)]
    pub control: ControlIS,
}

impl InformationState {
    /// Create an empty state for the given agent.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            private: PrivateIS::new(),
            shared: SharedIS::new(),
            control: ControlIS::default(),
        }
    }

    /// The agent opposite `speaker` in this dialogue.
    ///
    /// The kernel models two parties: this agent and "user".
    pub fn other_agent(&self, speaker: &str) -> String {
        if speaker == self.agent_id {
            "user".to_string()
        } else {
            self.agent_id.clone()
        }
    }

    /// Serialize to the canonical JSON document.
    pub fn to_json(&self) -> Result<String, DomainError> {
        serde_json::to_string(self).map_err(|e| DomainError::Serialization {
            field: "information_state".to_string(),
            detail: e.to_string(),
        })
    }

    /// Rehydrate from the canonical JSON document.
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json).map_err(|e| DomainError::Serialization {
            field: "information_state".to_string(),
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantics::dialogue_move::{DialogueMove, MoveType};
    use crate::semantics::question::Question;

    #[test]
    fn test_new_state_is_empty() {
        let state = InformationState::new("system");
        assert_eq!(state.agent_id, "system");
        assert!(state.shared.qud.is_empty());
        assert!(state.private.plan.is_empty());
    }

    #[test]
    fn test_clone_isolation() {
        let mut state = InformationState::new("system");
        state.shared.push_qud(Question::wh("x", "weather").unwrap());

        let mut cloned = state.clone();
        assert_eq!(cloned, state);

        cloned.shared.pop_qud();
        cloned.shared.commit("weather(sunny)");
        cloned
            .private
            .agenda
            .push_back(DialogueMove::new(MoveType::Greet, "hi", "system"));

        // The original is untouched
        assert_eq!(state.shared.qud.len(), 1);
        assert!(state.shared.commitments.is_empty());
        assert!(state.private.agenda.is_empty());
        assert_ne!(cloned, state);
    }

    #[test]
    fn test_other_agent() {
        let state = InformationState::new("system");
        assert_eq!(state.other_agent("user"), "system");
        assert_eq!(state.other_agent("system"), "user");
    }

    #[test]
    fn test_json_roundtrip() {
        let mut state = InformationState::new("system");
        state.shared.push_qud(Question::yn("raining").unwrap());
        state.shared.commit("destination: Paris");
        state
            .shared
            .moves
            .push(DialogueMove::new(MoveType::Ask, "What?", "user"));
        state.control.next_speaker = "system".to_string();

        let json = state.to_json().unwrap();
        let back = InformationState::from_json(&json).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn test_from_json_fails_loudly() {
        let result = InformationState::from_json("{\"agent_id\": 42}");
        assert!(matches!(
            result,
            Err(DomainError::Serialization { .. })
        ));
    }
}
