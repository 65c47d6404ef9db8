//! Question value types and resolution checks.

use crate::core::error::DomainError;
use crate::semantics::answer::Answer;
use crate::semantics::content::ContentValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Constraint key marking a synthesized clarification question.
pub const CONSTRAINT_IS_CLARIFICATION: &str = "is_clarification";
/// Constraint key holding the question being clarified.
pub const CONSTRAINT_FOR_QUESTION: &str = "for_question";
/// Constraint key holding the rejected answer content.
pub const CONSTRAINT_INVALID_ANSWER: &str = "invalid_answer";
/// Constraint key holding the surface wh-word an utterance started with.
pub const CONSTRAINT_WH_WORD: &str = "wh_word";

/// A question under (or headed for) discussion.
///
/// Three variants per Larsson (2002): wh-questions (`?x.predicate(x)`),
/// yes/no questions (`?proposition`), and alternative questions
/// (`?{a, b}`). Equality is structural; the [`Display`](std::fmt::Display)
/// form doubles as the question's signature in commitment strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Question {
    WhQuestion {
        variable: String,
        predicate: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        constraints: BTreeMap<String, ContentValue>,
    },
    YNQuestion {
        proposition: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        parameters: BTreeMap<String, ContentValue>,
    },
    AltQuestion { alternatives: Vec<String> },
}

impl Question {
    /// Create a wh-question over a domain predicate.
    pub fn wh(
        variable: impl Into<String>,
        predicate: impl Into<String>,
    ) -> Result<Self, DomainError> {
        Self::wh_with_constraints(variable, predicate, BTreeMap::new())
    }

    /// Create a wh-question with typed constraints.
    pub fn wh_with_constraints(
        variable: impl Into<String>,
        predicate: impl Into<String>,
        constraints: BTreeMap<String, ContentValue>,
    ) -> Result<Self, DomainError> {
        let variable = variable.into();
        let predicate = predicate.into();
        if predicate.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "WhQuestion requires a predicate".to_string(),
            ));
        }
        if variable.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "WhQuestion requires a variable".to_string(),
            ));
        }
        Ok(Question::WhQuestion {
            variable,
            predicate,
            constraints,
        })
    }

    /// Create a yes/no question over a domain proposition.
    pub fn yn(proposition: impl Into<String>) -> Result<Self, DomainError> {
        let proposition = proposition.into();
        if proposition.trim().is_empty() {
            return Err(DomainError::InvalidValue(
                "YNQuestion requires a proposition".to_string(),
            ));
        }
        Ok(Question::YNQuestion {
            proposition,
            parameters: BTreeMap::new(),
        })
    }

    /// Create an alternative question from an ordered list of alternatives.
    pub fn alt(alternatives: Vec<String>) -> Result<Self, DomainError> {
        if alternatives.is_empty() {
            return Err(DomainError::InvalidValue(
                "AltQuestion requires at least one alternative".to_string(),
            ));
        }
        if alternatives.iter().any(|a| a.trim().is_empty()) {
            return Err(DomainError::InvalidValue(
                "AltQuestion alternatives must be non-empty".to_string(),
            ));
        }
        Ok(Question::AltQuestion { alternatives })
    }

    /// The domain symbol this question asks about, when it has one.
    ///
    /// Wh-questions expose their predicate, yes/no questions their
    /// proposition; alternative questions carry no symbol.
    pub fn predicate(&self) -> Option<&str> {
        match self {
            Question::WhQuestion { predicate, .. } => Some(predicate),
            Question::YNQuestion { proposition, .. } => Some(proposition),
            Question::AltQuestion { .. } => None,
        }
    }

    /// The alternatives of an alternative question.
    pub fn alternatives(&self) -> Option<&[String]> {
        match self {
            Question::AltQuestion { alternatives } => Some(alternatives),
            _ => None,
        }
    }

    /// Look up a wh-question constraint by key.
    pub fn constraint(&self, key: &str) -> Option<&ContentValue> {
        match self {
            Question::WhQuestion { constraints, .. } => constraints.get(key),
            _ => None,
        }
    }

    /// Whether this is a synthesized clarification question.
    pub fn is_clarification(&self) -> bool {
        self.constraint(CONSTRAINT_IS_CLARIFICATION)
            .and_then(ContentValue::as_bool)
            .unwrap_or(false)
    }

    /// The canonical signature used in commitment strings.
    pub fn signature(&self) -> String {
        self.to_string()
    }

    /// Does this answer count as a resolution of this question?
    ///
    /// This is the structural check only; sort/type conformance is the
    /// domain model's `resolves`. Never errors — unrecognizable answers
    /// simply do not resolve.
    pub fn resolves_with(&self, answer: &Answer) -> bool {
        match self {
            Question::WhQuestion { .. } => !answer.content.is_empty(),
            Question::YNQuestion { .. } => answer.is_affirmative() || answer.is_negative(),
            Question::AltQuestion { alternatives } => match &answer.content {
                ContentValue::Text(s) => {
                    let s = s.trim();
                    alternatives.iter().any(|a| a == s)
                }
                _ => false,
            },
        }
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Question::WhQuestion { predicate, .. } => write!(f, "{}", predicate),
            Question::YNQuestion { proposition, .. } => write!(f, "{}?", proposition),
            Question::AltQuestion { alternatives } => {
                write!(f, "{}", alternatives.join("|"))
            }
        }
    }
}
