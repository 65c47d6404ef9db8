//! Generation rules: surface text for special ask moves.
//!
//! Plain move-type templates are the engine's fallback; rules here cover
//! the cases that need state context — plan-aware step announcements and
//! clarification re-asks.

use crate::rules::context::TurnContext;
use crate::rules::update_rule::{RulePhase, UpdateRule};
use ibis_domain::semantics::question::{CONSTRAINT_FOR_QUESTION, CONSTRAINT_INVALID_ANSWER};
use ibis_domain::{ContentValue, DomainModel, Question};
use std::sync::Arc;

fn generating_question(context: &TurnContext) -> Option<&Question> {
    context
        .generate_move
        .as_ref()
        .filter(|m| m.move_type == ibis_domain::MoveType::Ask)
        .and_then(|m| m.content.as_question())
}

/// Re-ask after an invalid answer, naming the rejected content and the
/// valid options when the original question enumerates them.
pub fn generate_clarification_ask() -> UpdateRule {
    UpdateRule::new(
        "generate_clarification_ask",
        RulePhase::Generation,
        |_, ctx| generating_question(ctx).is_some_and(Question::is_clarification),
        |state, ctx| {
            let Some(question) = generating_question(ctx) else {
                return state.clone();
            };
            let invalid = question
                .constraint(CONSTRAINT_INVALID_ANSWER)
                .map(|v| v.to_string())
                .unwrap_or_default();
            let reask = match question
                .constraint(CONSTRAINT_FOR_QUESTION)
                .and_then(ContentValue::as_question)
            {
                Some(Question::AltQuestion { alternatives }) => {
                    format!("Please choose one of: {}.", alternatives.join(", "))
                }
                Some(original) => format!("Could you answer again: {}?", original),
                None => "Could you rephrase?".to_string(),
            };
            ctx.generated_text = Some(format!(
                "Sorry, '{}' is not a valid answer. {}",
                invalid, reask
            ));
            state.clone()
        },
    )
    .with_priority(12)
}

/// Plan-aware question template: `[Step k of N] <description>?` driven by
/// the active task plan and the domain's predicate descriptions.
pub fn generate_plan_aware_ask(domain: Arc<DomainModel>) -> UpdateRule {
    let checker = domain.clone();
    UpdateRule::new(
        "generate_plan_aware_ask",
        RulePhase::Generation,
        move |state, ctx| {
            generating_question(ctx).is_some()
                && state.private.plan.iter().any(|plan| {
                    plan.is_active()
                        && plan
                            .plan_type
                            .task_name()
                            .is_some_and(|task| checker.has_task(task))
                })
        },
        move |state, ctx| {
            let Some(question) = generating_question(ctx) else {
                return state.clone();
            };
            let Some(plan) = state.private.plan.iter().find(|plan| {
                plan.is_active()
                    && plan
                        .plan_type
                        .task_name()
                        .is_some_and(|task| domain.has_task(task))
            }) else {
                return state.clone();
            };
            let (completed, total) = plan.subplan_progress();
            let step = (completed + 1).min(total.max(1));
            let description = question
                .predicate()
                .and_then(|p| domain.describe(p))
                .map(str::to_string)
                .unwrap_or_else(|| question.to_string());
            let description = description.trim_end_matches('?').trim_end();
            ctx.generated_text = Some(format!("[Step {} of {}] {}?", step, total, description));
            state.clone()
        },
    )
    .with_priority(10)
}
