//! Tagged content union for dialogue moves, answers, plans, and beliefs.

use crate::semantics::answer::Answer;
use crate::semantics::plan::Plan;
use crate::semantics::proposition::Proposition;
use crate::semantics::question::Question;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The value a move, answer, plan, or belief can carry.
///
/// Scalars round-trip as plain JSON scalars; structured variants carry their
/// own distinguishing fields (`Question` a `type` tag, `Proposition` a
/// `predicate`/`arguments` pair, `Plan` a `plan_type`). `Map` is the
/// catch-all object form and is tried last during deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Question(Question),
    Answer(Box<Answer>),
    Proposition(Proposition),
    Plan(Box<Plan>),
    List(Vec<ContentValue>),
    Map(BTreeMap<String, ContentValue>),
}

impl ContentValue {
    /// Empty text content.
    pub fn empty() -> Self {
        ContentValue::Text(String::new())
    }

    /// Whether this content counts as empty (blank text, empty collection).
    pub fn is_empty(&self) -> bool {
        match self {
            ContentValue::Text(s) => s.trim().is_empty(),
            ContentValue::List(items) => items.is_empty(),
            ContentValue::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ContentValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ContentValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_question(&self) -> Option<&Question> {
        match self {
            ContentValue::Question(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_answer(&self) -> Option<&Answer> {
        match self {
            ContentValue::Answer(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_proposition(&self) -> Option<&Proposition> {
        match self {
            ContentValue::Proposition(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ContentValue]> {
        match self {
            ContentValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentValue::Bool(b) => write!(f, "{}", b),
            // Integral numbers print without a trailing ".0" so commitment
            // strings stay in the canonical `pred(k=v)` shape.
            ContentValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                write!(f, "{}", *n as i64)
            }
            ContentValue::Number(n) => write!(f, "{}", n),
            ContentValue::Text(s) => write!(f, "{}", s),
            ContentValue::Question(q) => write!(f, "{}", q),
            ContentValue::Answer(a) => write!(f, "{}", a.content),
            ContentValue::Proposition(p) => write!(f, "{}", p),
            ContentValue::Plan(p) => write!(f, "{}", p.plan_type),
            ContentValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            ContentValue::Map(entries) => {
                let rendered: Vec<String> =
                    entries.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}

impl From<&str> for ContentValue {
    fn from(s: &str) -> Self {
        ContentValue::Text(s.to_string())
    }
}

impl From<String> for ContentValue {
    fn from(s: String) -> Self {
        ContentValue::Text(s)
    }
}

impl From<bool> for ContentValue {
    fn from(b: bool) -> Self {
        ContentValue::Bool(b)
    }
}

impl From<f64> for ContentValue {
    fn from(n: f64) -> Self {
        ContentValue::Number(n)
    }
}

impl From<Question> for ContentValue {
    fn from(q: Question) -> Self {
        ContentValue::Question(q)
    }
}

impl From<Answer> for ContentValue {
    fn from(a: Answer) -> Self {
        ContentValue::Answer(Box::new(a))
    }
}

impl From<Proposition> for ContentValue {
    fn from(p: Proposition) -> Self {
        ContentValue::Proposition(p)
    }
}

impl From<Plan> for ContentValue {
    fn from(p: Plan) -> Self {
        ContentValue::Plan(Box::new(p))
    }
}
