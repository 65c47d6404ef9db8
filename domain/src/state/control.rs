//! Control component of the information state.

use serde::{Deserialize, Serialize};

/// Who currently drives the dialogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Initiative {
    User,
    System,
    #[default]
    Mixed,
}

impl Initiative {
    pub fn as_str(&self) -> &'static str {
        match self {
            Initiative::User => "user",
            Initiative::System => "system",
            Initiative::Mixed => "mixed",
        }
    }
}

/// Lifecycle state of the dialogue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogueState {
    #[default]
    Active,
    Paused,
    Ended,
}

impl DialogueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogueState::Active => "active",
            DialogueState::Paused => "paused",
            DialogueState::Ended => "ended",
        }
    }
}

/// Turn-taking and lifecycle control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlIS {
    pub speaker: String,
    pub next_speaker: String,
    #[serde(default)]
    pub initiative: Initiative,
    #[serde(default)]
    pub dialogue_state: DialogueState,
}

impl Default for ControlIS {
    fn default() -> Self {
        Self {
            speaker: "user".to_string(),
            next_speaker: "user".to_string(),
            initiative: Initiative::Mixed,
            dialogue_state: DialogueState::Active,
        }
    }
}
