//! Answer value type.

use crate::core::error::DomainError;
use crate::semantics::content::ContentValue;
use crate::semantics::grounding::Polarity;
use crate::semantics::question::Question;
use serde::{Deserialize, Serialize};

/// Surface words accepted as an affirmative answer.
pub const AFFIRMATIVE_WORDS: &[&str] = &["yes", "yeah", "yep", "true"];
/// Surface words accepted as a negative answer.
pub const NEGATIVE_WORDS: &[&str] = &["no", "nope", "nah", "false"];

fn default_certainty() -> f64 {
    1.0
}

/// An answer, optionally bound to the question it was produced for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub content: ContentValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_ref: Option<Question>,
    #[serde(default = "default_certainty")]
    pub certainty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarity: Option<Polarity>,
}

impl Answer {
    /// Create a fully certain answer.
    pub fn new(content: impl Into<ContentValue>) -> Self {
        Self {
            content: content.into(),
            question_ref: None,
            certainty: 1.0,
            polarity: None,
        }
    }

    /// Create an answer with an explicit certainty in `[0, 1]`.
    pub fn with_certainty(
        content: impl Into<ContentValue>,
        certainty: f64,
    ) -> Result<Self, DomainError> {
        if !(0.0..=1.0).contains(&certainty) {
            return Err(DomainError::InvalidValue(format!(
                "Answer certainty must be in [0, 1], got {}",
                certainty
            )));
        }
        Ok(Self {
            certainty,
            ..Self::new(content)
        })
    }

    /// Bind this answer to the question it answers.
    pub fn for_question(mut self, question: Question) -> Self {
        self.question_ref = Some(question);
        self
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = Some(polarity);
        self
    }

    /// Whether the content reads as "yes".
    pub fn is_affirmative(&self) -> bool {
        match &self.content {
            ContentValue::Bool(b) => *b,
            ContentValue::Text(s) => {
                let s = s.trim().to_lowercase();
                AFFIRMATIVE_WORDS.contains(&s.as_str())
            }
            _ => false,
        }
    }

    /// Whether the content reads as "no".
    pub fn is_negative(&self) -> bool {
        match &self.content {
            ContentValue::Bool(b) => !*b,
            ContentValue::Text(s) => {
                let s = s.trim().to_lowercase();
                NEGATIVE_WORDS.contains(&s.as_str())
            }
            _ => false,
        }
    }

    /// The content in its canonical string form (for commitment strings).
    pub fn content_text(&self) -> String {
        self.content.to_string()
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
