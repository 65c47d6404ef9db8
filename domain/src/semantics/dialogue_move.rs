//! Dialogue moves, including ICM grounding moves.

use crate::semantics::content::ContentValue;
use crate::semantics::grounding::{ActionLevel, Polarity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The closed set of dialogue move types.
///
/// Domains extend behavior through move metadata, not new move types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveType {
    Ask,
    Answer,
    Assert,
    Greet,
    Quit,
    Request,
    Command,
    Inform,
    Icm,
}

impl MoveType {
    /// Returns the canonical string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveType::Ask => "ask",
            MoveType::Answer => "answer",
            MoveType::Assert => "assert",
            MoveType::Greet => "greet",
            MoveType::Quit => "quit",
            MoveType::Request => "request",
            MoveType::Command => "command",
            MoveType::Inform => "inform",
            MoveType::Icm => "icm",
        }
    }
}

impl std::str::FromStr for MoveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ask" => Ok(MoveType::Ask),
            "answer" => Ok(MoveType::Answer),
            "assert" => Ok(MoveType::Assert),
            "greet" => Ok(MoveType::Greet),
            "quit" => Ok(MoveType::Quit),
            "request" => Ok(MoveType::Request),
            "command" => Ok(MoveType::Command),
            "inform" => Ok(MoveType::Inform),
            "icm" => Ok(MoveType::Icm),
            _ => Err(format!("Invalid MoveType: {}", s)),
        }
    }
}

impl std::fmt::Display for MoveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single dialogue move — the unit of communication between agents.
///
/// ICM moves additionally populate [`feedback_level`](Self::feedback_level)
/// and [`polarity`](Self::polarity); an ICM move missing either is
/// structurally incomplete and has no signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueMove {
    pub move_type: MoveType,
    pub content: ContentValue,
    pub speaker: String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, ContentValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_level: Option<ActionLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarity: Option<Polarity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_move_index: Option<usize>,
}

impl DialogueMove {
    pub fn new(
        move_type: MoveType,
        content: impl Into<ContentValue>,
        speaker: impl Into<String>,
    ) -> Self {
        Self {
            move_type,
            content: content.into(),
            speaker: speaker.into(),
            timestamp: 0.0,
            metadata: BTreeMap::new(),
            feedback_level: None,
            polarity: None,
            target_move_index: None,
        }
    }

    /// Core ICM constructor; prefer the named level/polarity factories.
    pub fn icm(
        level: ActionLevel,
        polarity: Polarity,
        content: impl Into<ContentValue>,
        speaker: impl Into<String>,
    ) -> Self {
        Self {
            feedback_level: Some(level),
            polarity: Some(polarity),
            ..Self::new(MoveType::Icm, content, speaker)
        }
    }

    /// `per*pos` — "I heard you".
    pub fn icm_perception_positive(
        content: impl Into<ContentValue>,
        speaker: impl Into<String>,
    ) -> Self {
        Self::icm(ActionLevel::Perception, Polarity::Positive, content, speaker)
    }

    /// `per*neg` — "Pardon?"
    pub fn icm_perception_negative(
        content: impl Into<ContentValue>,
        speaker: impl Into<String>,
    ) -> Self {
        Self::icm(ActionLevel::Perception, Polarity::Negative, content, speaker)
    }

    /// `und*pos` — understanding display ("To Paris.").
    pub fn icm_understanding_positive(
        content: impl Into<ContentValue>,
        speaker: impl Into<String>,
    ) -> Self {
        Self::icm(
            ActionLevel::Understanding,
            Polarity::Positive,
            content,
            speaker,
        )
    }

    /// `und*neg` — "I don't understand".
    pub fn icm_understanding_negative(
        content: impl Into<ContentValue>,
        speaker: impl Into<String>,
    ) -> Self {
        Self::icm(
            ActionLevel::Understanding,
            Polarity::Negative,
            content,
            speaker,
        )
    }

    /// `und*int` — confirmation check ("Paris, is that correct?").
    pub fn icm_understanding_interrogative(
        content: impl Into<ContentValue>,
        speaker: impl Into<String>,
    ) -> Self {
        Self::icm(
            ActionLevel::Understanding,
            Polarity::Interrogative,
            content,
            speaker,
        )
    }

    /// `acc*pos` — "Okay".
    pub fn icm_acceptance_positive(
        content: impl Into<ContentValue>,
        speaker: impl Into<String>,
    ) -> Self {
        Self::icm(ActionLevel::Acceptance, Polarity::Positive, content, speaker)
    }

    /// `acc*neg` — "Sorry, I can't do that".
    pub fn icm_acceptance_negative(
        content: impl Into<ContentValue>,
        speaker: impl Into<String>,
    ) -> Self {
        Self::icm(ActionLevel::Acceptance, Polarity::Negative, content, speaker)
    }

    /// Point this move at an earlier move in the grounded history.
    pub fn with_target(mut self, index: usize) -> Self {
        self.target_move_index = Some(index);
        self
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<ContentValue>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_icm(&self) -> bool {
        self.move_type == MoveType::Icm
    }

    /// The `<level>*<polarity>` signature of a structurally complete ICM
    /// move, e.g. `per*neg`.
    pub fn icm_signature(&self) -> Option<String> {
        if !self.is_icm() {
            return None;
        }
        match (self.feedback_level, self.polarity) {
            (Some(level), Some(polarity)) => Some(format!("{}*{}", level, polarity)),
            _ => None,
        }
    }

    /// Confidence attached by NLU, if any.
    pub fn confidence(&self) -> Option<f64> {
        self.metadata.get("confidence").and_then(ContentValue::as_number)
    }
}

impl std::fmt::Display for DialogueMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.icm_signature() {
            Some(signature) => {
                write!(f, "{}:icm:{}({})", self.speaker, signature, self.content)
            }
            None => write!(f, "{}:{}({})", self.speaker, self.move_type, self.content),
        }
    }
}
