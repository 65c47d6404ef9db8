//! Predicate declarations.

use serde::{Deserialize, Serialize};

/// Declarative description of a domain predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSpec {
    pub name: String,
    pub arity: usize,
    #[serde(default)]
    pub arg_types: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl PredicateSpec {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
            arg_types: Vec::new(),
            description: String::new(),
        }
    }

    pub fn with_arg_types(mut self, arg_types: Vec<String>) -> Self {
        self.arg_types = arg_types;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
