//! Typed per-turn context threaded alongside the information state.

use ibis_domain::{ContentValue, DialogueMove, Question};

/// Per-phase scratch channel between the engine and the rules.
///
/// The engine seeds a fresh context at the start of each phase and drops it
/// at the phase boundary, so nothing here survives into the next phase or
/// leaks into the persistent belief store. Interpretation rules write the
/// moves they recognize to [`produced_moves`](Self::produced_moves);
/// selection rules hand their choice back through
/// [`response_move`](Self::response_move); answer integration raises the
/// clarification fields for the accommodation rule running later in the
/// same phase.
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    /// Raw input being interpreted.
    pub utterance: Option<String>,
    /// Who produced the input.
    pub speaker: Option<String>,
    /// The move currently being integrated.
    pub current_move: Option<DialogueMove>,
    /// The move currently being surfaced.
    pub generate_move: Option<DialogueMove>,
    /// Surface text produced by a generation rule.
    pub generated_text: Option<String>,
    /// Raised by answer integration when an answer cannot be accepted.
    pub needs_clarification: bool,
    /// The question whose answer was rejected.
    pub clarification_question: Option<Question>,
    /// The offending answer content.
    pub invalid_answer: Option<ContentValue>,
    /// Moves recognized by interpretation rules.
    pub produced_moves: Vec<DialogueMove>,
    /// Move chosen by a selection rule.
    pub response_move: Option<DialogueMove>,
}

impl TurnContext {
    /// Context for the interpret phase.
    pub fn for_utterance(utterance: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self {
            utterance: Some(utterance.into()),
            speaker: Some(speaker.into()),
            ..Self::default()
        }
    }

    /// Context for the integrate phase.
    pub fn for_move(dialogue_move: DialogueMove) -> Self {
        Self {
            current_move: Some(dialogue_move),
            ..Self::default()
        }
    }

    /// Context for the generate phase.
    pub fn for_generation(dialogue_move: DialogueMove) -> Self {
        Self {
            generate_move: Some(dialogue_move),
            ..Self::default()
        }
    }

    /// The utterance, trimmed, or empty.
    pub fn utterance_text(&self) -> &str {
        self.utterance.as_deref().unwrap_or("").trim()
    }

    /// The speaker, defaulting to "user".
    pub fn speaker_id(&self) -> &str {
        self.speaker.as_deref().unwrap_or("user")
    }
}
