//! Shared (common-ground) component of the information state.

use crate::model::action::ActionRecord;
use crate::semantics::dialogue_move::DialogueMove;
use crate::semantics::question::Question;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Recency buffer bound for [`SharedIS::last_moves`].
pub const LAST_MOVES_LIMIT: usize = 10;

/// Publicly visible common ground: the QUD stack, commitments, and the
/// grounded move history.
///
/// The QUD is a genuine LIFO stack — the last element is the top. Answers
/// resolve the top only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedIS {
    #[serde(default)]
    pub qud: Vec<Question>,
    #[serde(default)]
    pub commitments: BTreeSet<String>,
    #[serde(default)]
    pub last_moves: Vec<DialogueMove>,
    #[serde(default)]
    pub moves: Vec<DialogueMove>,
    #[serde(default)]
    pub next_moves: VecDeque<DialogueMove>,
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

impl SharedIS {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a question onto the QUD stack.
    pub fn push_qud(&mut self, question: Question) {
        self.qud.push(question);
    }

    /// Pop the top question; `None` on an empty stack, never an error.
    pub fn pop_qud(&mut self) -> Option<Question> {
        self.qud.pop()
    }

    /// The top question without removing it.
    pub fn top_qud(&self) -> Option<&Question> {
        self.qud.last()
    }

    /// Add a grounded commitment string.
    pub fn commit(&mut self, commitment: impl Into<String>) {
        self.commitments.insert(commitment.into());
    }

    /// Append to the bounded recency buffer.
    ///
    /// Consecutive duplicates are collapsed so a move integrated by several
    /// rules in one phase appears once.
    pub fn push_last_move(&mut self, dialogue_move: DialogueMove) {
        if self.last_moves.last() == Some(&dialogue_move) {
            return;
        }
        self.last_moves.push(dialogue_move);
        if self.last_moves.len() > LAST_MOVES_LIMIT {
            let overflow = self.last_moves.len() - LAST_MOVES_LIMIT;
            self.last_moves.drain(..overflow);
        }
    }
}
