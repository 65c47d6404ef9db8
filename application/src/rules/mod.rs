//! The rule engine and the standard rule library.
//!
//! An [`UpdateRule`](update_rule::UpdateRule) is a named, prioritized pair
//! of closures over the information state and the per-turn
//! [`TurnContext`](context::TurnContext). Rules are grouped into
//! priority-ordered buckets per phase by
//! [`RuleSet`](update_rule::RuleSet); the standard library modules build
//! the concrete rules of Larsson's update, selection, and negotiation
//! algorithms, parameterized by a
//! [`DomainModel`](ibis_domain::DomainModel).

pub mod context;
pub mod generation;
pub mod grounding;
pub mod integration;
pub mod interpretation;
pub mod negotiation;
pub mod selection;
pub mod standard;
pub mod update_rule;
