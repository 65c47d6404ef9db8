//! Propositions and the canonical `pred(k=v, ...)` string form.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A domain proposition — a predicate over named arguments.
///
/// Used by negotiation (IUN, dominance) and by commitments in their
/// canonical string form `pred(k1=v1, k2=v2)`. Arguments are kept sorted so
/// the printed form is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Proposition {
    pub predicate: String,
    #[serde(default)]
    pub arguments: BTreeMap<String, String>,
}

impl Proposition {
    pub fn new(predicate: impl Into<String>) -> Self {
        Self {
            predicate: predicate.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Add an argument (builder style).
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Parse the canonical string form.
    ///
    /// `pred`, `pred()`, and `pred(k=v, k2=v2)` are all accepted; anything
    /// else fails with [`DomainError::InvalidValue`].
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::InvalidValue(
                "empty proposition string".to_string(),
            ));
        }
        let Some(open) = s.find('(') else {
            if s.contains(')') || s.contains('=') {
                return Err(DomainError::InvalidValue(format!(
                    "malformed proposition: {}",
                    s
                )));
            }
            return Ok(Proposition::new(s));
        };
        if !s.ends_with(')') {
            return Err(DomainError::InvalidValue(format!(
                "unbalanced parentheses in proposition: {}",
                s
            )));
        }
        let predicate = s[..open].trim();
        if predicate.is_empty() {
            return Err(DomainError::InvalidValue(format!(
                "proposition without predicate: {}",
                s
            )));
        }
        let inner = s[open + 1..s.len() - 1].trim();
        let mut proposition = Proposition::new(predicate);
        if inner.is_empty() {
            return Ok(proposition);
        }
        for pair in inner.split(',') {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(DomainError::InvalidValue(format!(
                    "malformed argument '{}' in proposition: {}",
                    pair.trim(),
                    s
                )));
            };
            proposition
                .arguments
                .insert(key.trim().to_string(), value.trim().to_string());
        }
        Ok(proposition)
    }

    /// Same predicate and same arguments.
    pub fn matches(&self, other: &Proposition) -> bool {
        self == other
    }

    /// Same predicate with at least one shared argument key holding a
    /// different value.
    pub fn conflicts_with(&self, other: &Proposition) -> bool {
        if self.predicate != other.predicate {
            return false;
        }
        self.arguments
            .iter()
            .any(|(key, value)| other.arguments.get(key).is_some_and(|v| v != value))
    }

    /// Whether any commitment string in `commitments` encodes a conflicting
    /// instance of this predicate.
    pub fn conflicts_with_commitments<'a, I>(&self, commitments: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        commitments.into_iter().any(|c| {
            Proposition::parse(c).is_ok_and(|committed| self.conflicts_with(&committed))
        })
    }
}

impl std::fmt::Display for Proposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let args: Vec<String> = self
            .arguments
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "{}({})", self.predicate, args.join(", "))
    }
}
