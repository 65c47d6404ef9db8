//! The pluggable domain model.
//!
//! A [`DomainModel`] injects domain-specific semantics into the otherwise
//! domain-agnostic rule library: predicates and their sorts, task plan
//! builders, action pre/postconditions, and dominance relations for
//! negotiation. Registries are written once at construction and read-only
//! afterwards.

pub mod action;
pub mod predicate;

use crate::core::error::DomainError;
use crate::semantics::answer::Answer;
use crate::semantics::content::ContentValue;
use crate::semantics::plan::Plan;
use crate::semantics::proposition::Proposition;
use crate::semantics::question::Question;
use action::Action;
use predicate::PredicateSpec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

type PlanBuilder = Box<dyn Fn(&BTreeMap<String, ContentValue>) -> Plan + Send + Sync>;
type PrecondFn = Box<dyn Fn(&Action, &BTreeSet<String>) -> (bool, String) + Send + Sync>;
type PostcondFn = Box<dyn Fn(&Action) -> Vec<Proposition> + Send + Sync>;
type DominanceFn = Box<dyn Fn(&Proposition, &Proposition) -> bool + Send + Sync>;

/// Registry of domain semantics consumed by the standard rules.
pub struct DomainModel {
    name: String,
    predicates: BTreeMap<String, PredicateSpec>,
    sorts: BTreeMap<String, Vec<String>>,
    plan_builders: BTreeMap<String, PlanBuilder>,
    task_triggers: BTreeMap<String, Vec<String>>,
    precond_functions: BTreeMap<String, PrecondFn>,
    postcond_functions: BTreeMap<String, PostcondFn>,
    dominance_functions: BTreeMap<String, DominanceFn>,
}

impl DomainModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predicates: BTreeMap::new(),
            sorts: BTreeMap::new(),
            plan_builders: BTreeMap::new(),
            task_triggers: BTreeMap::new(),
            precond_functions: BTreeMap::new(),
            postcond_functions: BTreeMap::new(),
            dominance_functions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicates(&self) -> &BTreeMap<String, PredicateSpec> {
        &self.predicates
    }

    pub fn sorts(&self) -> &BTreeMap<String, Vec<String>> {
        &self.sorts
    }

    /// Declare a predicate. Arity 0 is legal. Sort checking is lazy, so the
    /// argument sorts need not be defined yet (or at all).
    pub fn add_predicate(
        &mut self,
        name: impl Into<String>,
        arity: usize,
        arg_types: Vec<String>,
        description: impl Into<String>,
    ) {
        let name = name.into();
        self.predicates.insert(
            name.clone(),
            PredicateSpec::new(name, arity)
                .with_arg_types(arg_types)
                .with_description(description),
        );
    }

    /// Declare the closed value set for a sort.
    pub fn add_sort(&mut self, name: impl Into<String>, individuals: Vec<String>) {
        self.sorts.insert(name.into(), individuals);
    }

    /// Register a plan builder for a task.
    pub fn register_plan_builder<F>(&mut self, task_name: impl Into<String>, builder: F)
    where
        F: Fn(&BTreeMap<String, ContentValue>) -> Plan + Send + Sync + 'static,
    {
        self.plan_builders.insert(task_name.into(), Box::new(builder));
    }

    /// Register surface phrases that indicate a task request, used by the
    /// task-plan formation rule to keep task matching out of the rule
    /// library.
    pub fn add_task_trigger(&mut self, task_name: impl Into<String>, phrases: Vec<String>) {
        let phrases = phrases.into_iter().map(|p| p.to_lowercase()).collect();
        self.task_triggers.insert(task_name.into(), phrases);
    }

    /// Registered task names, in registration-table order.
    pub fn tasks(&self) -> Vec<&str> {
        self.plan_builders.keys().map(String::as_str).collect()
    }

    /// Whether `task_name` has a registered plan builder.
    pub fn has_task(&self, task_name: &str) -> bool {
        self.plan_builders.contains_key(task_name)
    }

    /// Match free text against the registered task triggers.
    pub fn match_task(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.task_triggers
            .iter()
            .find(|(_, phrases)| phrases.iter().any(|p| text.contains(p.as_str())))
            .map(|(task, _)| task.as_str())
    }

    /// Build the plan for a task. Unknown tasks fail with
    /// [`DomainError::UnknownTask`].
    pub fn get_plan(
        &self,
        task_name: &str,
        context: &BTreeMap<String, ContentValue>,
    ) -> Result<Plan, DomainError> {
        let builder = self
            .plan_builders
            .get(task_name)
            .ok_or_else(|| DomainError::UnknownTask(task_name.to_string()))?;
        Ok(builder(context))
    }

    pub fn register_precond_function<F>(&mut self, action_name: impl Into<String>, function: F)
    where
        F: Fn(&Action, &BTreeSet<String>) -> (bool, String) + Send + Sync + 'static,
    {
        self.precond_functions
            .insert(action_name.into(), Box::new(function));
    }

    pub fn register_postcond_function<F>(&mut self, action_name: impl Into<String>, function: F)
    where
        F: Fn(&Action) -> Vec<Proposition> + Send + Sync + 'static,
    {
        self.postcond_functions
            .insert(action_name.into(), Box::new(function));
    }

    pub fn register_dominance_function<F>(&mut self, predicate: impl Into<String>, function: F)
    where
        F: Fn(&Proposition, &Proposition) -> bool + Send + Sync + 'static,
    {
        self.dominance_functions
            .insert(predicate.into(), Box::new(function));
    }

    /// Check an action's preconditions against the commitment set.
    ///
    /// A registered function wins; the fallback requires each declared
    /// precondition string to appear as an exact member or as a prefix of
    /// some commitment (declared `check_in_date` matches the commitment
    /// `check_in_date: 2025-01-05`).
    pub fn check_preconditions(
        &self,
        action: &Action,
        commitments: &BTreeSet<String>,
    ) -> (bool, String) {
        if let Some(function) = self.precond_functions.get(&action.name) {
            return function(action, commitments);
        }
        for condition in &action.preconditions {
            let satisfied = commitments
                .iter()
                .any(|c| c == condition || c.starts_with(condition.as_str()));
            if !satisfied {
                return (false, format!("missing precondition: {}", condition));
            }
        }
        (true, String::new())
    }

    /// The propositions an action establishes.
    ///
    /// A registered function wins; the fallback parses the declared
    /// postcondition strings, skipping any that are not in canonical form.
    pub fn postcond(&self, action: &Action) -> Vec<Proposition> {
        if let Some(function) = self.postcond_functions.get(&action.name) {
            return function(action);
        }
        action
            .postconditions
            .iter()
            .filter_map(|s| Proposition::parse(s).ok())
            .collect()
    }

    /// Does `first` dominate `second` per the domain preference?
    ///
    /// False when the predicates differ or no dominance function is
    /// registered for the predicate.
    pub fn dominates(&self, first: &Proposition, second: &Proposition) -> bool {
        if first.predicate != second.predicate {
            return false;
        }
        match self.dominance_functions.get(&first.predicate) {
            Some(function) => function(first, second),
            None => false,
        }
    }

    /// An alternative sharing the rejected proposition's predicate that
    /// dominates it, if any.
    pub fn get_better_alternative(
        &self,
        rejected: &Proposition,
        alternatives: &BTreeSet<Proposition>,
    ) -> Option<Proposition> {
        alternatives
            .iter()
            .find(|candidate| {
                candidate.predicate == rejected.predicate && self.dominates(candidate, rejected)
            })
            .cloned()
    }

    /// Full resolution check: the structural [`Question::resolves_with`]
    /// composed with the sort/type check for the question's predicate.
    pub fn resolves(&self, answer: &Answer, question: &Question) -> bool {
        question.resolves_with(answer) && self.check_types(answer, question)
    }

    /// Looser relevance check used for volunteer-information routing: an
    /// answer bound to a question about the same predicate is relevant even
    /// if it would not resolve the question asked.
    pub fn relevant(&self, answer: &Answer, question: &Question) -> bool {
        match (&answer.question_ref, question.predicate()) {
            (Some(bound), Some(predicate)) => bound.predicate() == Some(predicate),
            _ => self.resolves(answer, question),
        }
    }

    /// Human-readable description of a predicate, when declared.
    pub fn describe(&self, predicate: &str) -> Option<&str> {
        self.predicates
            .get(predicate)
            .map(|spec| spec.description.as_str())
            .filter(|d| !d.is_empty())
    }

    fn check_types(&self, answer: &Answer, question: &Question) -> bool {
        let Some(predicate) = question.predicate() else {
            return true;
        };
        let Some(spec) = self.predicates.get(predicate) else {
            return true;
        };
        let Some(sort) = spec.arg_types.first() else {
            return true;
        };
        self.value_has_type(&answer.content_text(), sort)
    }

    fn value_has_type(&self, value: &str, sort: &str) -> bool {
        if value.trim().is_empty() {
            return false;
        }
        match self.sorts.get(sort) {
            Some(individuals) => individuals.iter().any(|i| i == value.trim()),
            // Undefined sorts accept any non-empty value
            None => true,
        }
    }

    /// The serializable, declarative part of this model. Registered
    /// functions are process-local and must be re-registered after
    /// rehydration.
    pub fn declaration(&self) -> DomainDeclaration {
        DomainDeclaration {
            name: self.name.clone(),
            predicates: self.predicates.clone(),
            sorts: self.sorts.clone(),
            tasks: self.tasks().iter().map(|t| t.to_string()).collect(),
            task_triggers: self.task_triggers.clone(),
        }
    }

    /// Rebuild the declarative registries from a declaration.
    pub fn from_declaration(declaration: DomainDeclaration) -> Self {
        let mut model = DomainModel::new(declaration.name);
        model.predicates = declaration.predicates;
        model.sorts = declaration.sorts;
        model.task_triggers = declaration.task_triggers;
        model
    }
}

impl std::fmt::Debug for DomainModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainModel")
            .field("name", &self.name)
            .field("predicates", &self.predicates.len())
            .field("sorts", &self.sorts.len())
            .field("plan_builders", &self.plan_builders.len())
            .field("dominance_functions", &self.dominance_functions.len())
            .finish()
    }
}

/// The declarative (serializable) portion of a [`DomainModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDeclaration {
    pub name: String,
    #[serde(default)]
    pub predicates: BTreeMap<String, PredicateSpec>,
    #[serde(default)]
    pub sorts: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub task_triggers: BTreeMap<String, Vec<String>>,
}
