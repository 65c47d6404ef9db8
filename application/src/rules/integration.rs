//! Integration rules: update the information state from dialogue moves.
//!
//! This is where Larsson's update algorithm lives: task-plan formation,
//! issue accommodation from plans (Rule 4.1), QUD management, answer
//! integration with volunteer-information handling, and clarification
//! accommodation (Rule 4.3). Clarification accommodation is registered at
//! the same priority as answer integration and inserted after it, so it
//! fires within the same phase pass once the answer rule has raised the
//! clarification fields on the turn context.

use crate::rules::context::TurnContext;
use crate::rules::update_rule::{RulePhase, UpdateRule};
use ibis_domain::semantics::question;
use ibis_domain::{
    ContentValue, DialogueMove, DialogueState, DomainModel, InformationState, MoveType, Question,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

fn current_move(context: &TurnContext) -> Option<&DialogueMove> {
    context.current_move.as_ref()
}

fn is_move(context: &TurnContext, move_type: MoveType) -> bool {
    current_move(context).is_some_and(|m| m.move_type == move_type)
}

/// The task a command/request move asks for, if the domain recognizes one.
fn requested_task<'a>(domain: &'a DomainModel, dialogue_move: &DialogueMove) -> Option<&'a str> {
    if let Some(task) = dialogue_move
        .metadata
        .get("task_type")
        .and_then(ContentValue::as_text)
    {
        if domain.has_task(task) {
            // Borrow the domain's own copy of the name
            return domain.tasks().into_iter().find(|t| *t == task);
        }
    }
    domain.match_task(&dialogue_move.content.to_string())
}

/// Form the task plan for a command/request move via the domain model.
///
/// The plan's findout questions are NOT pushed to QUD here; they are
/// accommodated to private issues by `accommodate_findout_to_issues` and
/// raised on demand by selection.
pub fn form_task_plan(domain: Arc<DomainModel>) -> UpdateRule {
    let matcher = domain.clone();
    UpdateRule::new(
        "form_task_plan",
        RulePhase::Integration,
        move |_, ctx| {
            current_move(ctx).is_some_and(|m| {
                matches!(m.move_type, MoveType::Command | MoveType::Request)
                    && requested_task(&matcher, m).is_some()
            })
        },
        move |state, ctx| {
            let mut new_state = state.clone();
            let Some(dialogue_move) = current_move(ctx).cloned() else {
                return new_state;
            };
            if let Some(task) = requested_task(&domain, &dialogue_move) {
                let context: BTreeMap<String, ContentValue> = dialogue_move.metadata.clone();
                match domain.get_plan(task, &context) {
                    Ok(plan) => {
                        debug!(task, "formed task plan");
                        new_state.private.plan.push(plan);
                        new_state
                            .private
                            .beliefs
                            .insert("domain".to_string(), ContentValue::from(domain.name()));
                        new_state
                            .private
                            .beliefs
                            .insert("document_type".to_string(), ContentValue::from(task));
                    }
                    // The only domain error integration absorbs: an
                    // unmatched task leaves the state planless.
                    Err(error) => warn!(task, %error, "task plan formation skipped"),
                }
            }
            new_state.shared.push_last_move(dialogue_move);
            new_state.control.next_speaker = new_state.agent_id.clone();
            new_state
        },
    )
    .with_priority(13)
}

/// Rule 4.1 (issue accommodation): move the questions of active findout
/// subplans into the private issue queue, in subplan order, without
/// touching the QUD. Running it twice in a row is a no-op.
pub fn accommodate_findout_to_issues() -> UpdateRule {
    UpdateRule::new(
        "accommodate_findout_to_issues",
        RulePhase::Integration,
        |state, _| {
            state.private.plan.iter().any(|plan| {
                plan.active_findout_questions()
                    .iter()
                    .any(|q| !state.private.issues.contains(q) && !state.shared.qud.contains(q))
            })
        },
        |state, _| {
            let mut new_state = state.clone();
            let pending: Vec<Question> = new_state
                .private
                .plan
                .iter()
                .flat_map(|plan| plan.active_findout_questions())
                .filter(|q| {
                    !new_state.private.issues.contains(q) && !new_state.shared.qud.contains(q)
                })
                .cloned()
                .collect();
            for question in pending {
                if !new_state.private.issues.contains(&question) {
                    debug!(issue = %question, "accommodated findout to issues");
                    new_state.private.issues.push(question);
                }
            }
            new_state
        },
    )
    .with_priority(13)
}

pub fn integrate_command() -> UpdateRule {
    UpdateRule::new(
        "integrate_command",
        RulePhase::Integration,
        |_, ctx| is_move(ctx, MoveType::Command),
        |state, ctx| {
            let mut new_state = state.clone();
            if let Some(dialogue_move) = current_move(ctx).cloned() {
                new_state.shared.push_last_move(dialogue_move);
                new_state.control.next_speaker = new_state.agent_id.clone();
            }
            new_state
        },
    )
    .with_priority(12)
}

// Kept separate from integrate_command so domains can diverge the two later.
pub fn integrate_request() -> UpdateRule {
    UpdateRule::new(
        "integrate_request",
        RulePhase::Integration,
        |_, ctx| is_move(ctx, MoveType::Request),
        |state, ctx| {
            let mut new_state = state.clone();
            if let Some(dialogue_move) = current_move(ctx).cloned() {
                new_state.shared.push_last_move(dialogue_move);
                new_state.control.next_speaker = new_state.agent_id.clone();
            }
            new_state
        },
    )
    .with_priority(11)
}

/// Push an asked question onto the QUD and hand the turn to the other
/// agent.
pub fn integrate_question() -> UpdateRule {
    UpdateRule::new(
        "integrate_question",
        RulePhase::Integration,
        |_, ctx| {
            is_move(ctx, MoveType::Ask)
                && current_move(ctx).is_some_and(|m| m.content.as_question().is_some())
        },
        |state, ctx| {
            let mut new_state = state.clone();
            let Some(dialogue_move) = current_move(ctx).cloned() else {
                return new_state;
            };
            if let Some(question) = dialogue_move.content.as_question() {
                new_state.shared.push_qud(question.clone());
            }
            new_state.control.next_speaker = new_state.other_agent(&dialogue_move.speaker);
            new_state.shared.push_last_move(dialogue_move);
            new_state
        },
    )
    .with_priority(10)
}

/// Whether `answer` volunteers information for a queued private issue.
fn volunteered_issue(state: &InformationState, answer: &ibis_domain::Answer) -> Option<Question> {
    let bound = answer.question_ref.as_ref()?;
    state
        .private
        .issues
        .iter()
        .find(|issue| {
            *issue == bound
                || (issue.predicate().is_some() && issue.predicate() == bound.predicate())
        })
        .cloned()
}

/// Integrate an answer move (with IBiS-3 volunteer handling).
///
/// Three cases: resolve the top QUD, absorb a volunteered answer to a
/// private issue, or flag the answer as invalid so clarification
/// accommodation (Rule 4.3) can repair the dialogue.
pub fn integrate_answer(domain: Arc<DomainModel>) -> UpdateRule {
    UpdateRule::new(
        "integrate_answer",
        RulePhase::Integration,
        |_, ctx| {
            is_move(ctx, MoveType::Answer)
                && current_move(ctx).is_some_and(|m| m.content.as_answer().is_some())
        },
        move |state, ctx| {
            let mut new_state = state.clone();
            let Some(dialogue_move) = current_move(ctx).cloned() else {
                return new_state;
            };
            let Some(answer) = dialogue_move.content.as_answer().cloned() else {
                return new_state;
            };

            let mut handled = false;

            // Case 1: the answer resolves the top QUD. Resolving a
            // clarification question repairs the suspended question under
            // it: the answer is applied to the original question, and only
            // that resolution is committed.
            if let Some(top) = new_state.shared.top_qud().cloned() {
                if domain.resolves(&answer, &top) {
                    new_state.shared.pop_qud();
                    if top.is_clarification() {
                        let original = top
                            .constraint(question::CONSTRAINT_FOR_QUESTION)
                            .and_then(ContentValue::as_question)
                            .cloned();
                        if let Some(original) = original {
                            if new_state.shared.top_qud() == Some(&original)
                                && domain.resolves(&answer, &original)
                            {
                                new_state.shared.pop_qud();
                                new_state.shared.commit(format!(
                                    "{}: {}",
                                    original.signature(),
                                    answer.content_text()
                                ));
                                new_state.private.complete_findout_for(&original);
                            }
                        }
                    } else {
                        new_state
                            .shared
                            .commit(format!("{}: {}", top.signature(), answer.content_text()));
                        new_state.private.complete_findout_for(&top);
                    }
                    handled = true;
                }
            }

            // Case 2: volunteered information for a queued issue. The QUD
            // is left alone.
            if !handled {
                if let Some(issue) = volunteered_issue(&new_state, &answer) {
                    new_state.private.remove_issue(&issue);
                    new_state
                        .shared
                        .commit(format!("{}: {}", issue.signature(), answer.content_text()));
                    new_state.private.complete_findout_for(&issue);
                    handled = true;
                }
            }

            // Case 3: unacceptable answer to the question under discussion.
            if !handled {
                if let Some(top) = new_state.shared.top_qud() {
                    ctx.needs_clarification = true;
                    ctx.clarification_question = Some(top.clone());
                    ctx.invalid_answer = Some(answer.content.clone());
                }
            }

            new_state.control.next_speaker = new_state.other_agent(&dialogue_move.speaker);
            new_state.shared.push_last_move(dialogue_move);
            new_state
        },
    )
    .with_priority(9)
}

/// Rule 4.3 (issue clarification): push a synthesized clarification
/// question when answer integration flagged an invalid answer. Never
/// stacks a second clarification on top of an existing one.
pub fn accommodate_clarification() -> UpdateRule {
    UpdateRule::new(
        "accommodate_clarification",
        RulePhase::Integration,
        |state, ctx| {
            ctx.needs_clarification
                && ctx.clarification_question.is_some()
                && !state.shared.top_qud().is_some_and(Question::is_clarification)
        },
        |state, ctx| {
            let mut new_state = state.clone();
            let Some(original) = ctx.clarification_question.clone() else {
                return new_state;
            };
            let invalid = ctx
                .invalid_answer
                .clone()
                .unwrap_or_else(ContentValue::empty);

            let mut constraints = BTreeMap::new();
            constraints.insert(
                question::CONSTRAINT_IS_CLARIFICATION.to_string(),
                ContentValue::from(true),
            );
            constraints.insert(
                question::CONSTRAINT_FOR_QUESTION.to_string(),
                ContentValue::from(original.clone()),
            );
            constraints.insert(question::CONSTRAINT_INVALID_ANSWER.to_string(), invalid);

            let Ok(clarification) =
                Question::wh_with_constraints("x", "clarification", constraints)
            else {
                return new_state;
            };
            debug!(original = %original, "accommodated clarification question");
            new_state.shared.push_qud(clarification);
            ctx.needs_clarification = false;
            new_state
        },
    )
    .with_priority(9)
}

/// Add an assertion to the commitment store, unless the asserted
/// proposition is currently under negotiation.
pub fn integrate_assertion() -> UpdateRule {
    UpdateRule::new(
        "integrate_assertion",
        RulePhase::Integration,
        |_, ctx| is_move(ctx, MoveType::Assert),
        |state, ctx| {
            let mut new_state = state.clone();
            let Some(dialogue_move) = current_move(ctx).cloned() else {
                return new_state;
            };
            let under_negotiation = dialogue_move
                .content
                .as_proposition()
                .is_some_and(|p| new_state.private.iun.contains(p));
            if !dialogue_move.content.is_empty() && !under_negotiation {
                new_state.shared.commit(dialogue_move.content.to_string());
            }
            new_state.control.next_speaker = new_state.other_agent(&dialogue_move.speaker);
            new_state.shared.push_last_move(dialogue_move);
            new_state
        },
    )
    .with_priority(8)
}

pub fn integrate_greet() -> UpdateRule {
    UpdateRule::new(
        "integrate_greet",
        RulePhase::Integration,
        |_, ctx| is_move(ctx, MoveType::Greet),
        |state, ctx| {
            let mut new_state = state.clone();
            let Some(dialogue_move) = current_move(ctx).cloned() else {
                return new_state;
            };
            new_state.control.dialogue_state = DialogueState::Active;
            if dialogue_move.speaker != new_state.agent_id {
                new_state.control.next_speaker = new_state.agent_id.clone();
                let response = DialogueMove::new(
                    MoveType::Greet,
                    "greeting_response",
                    new_state.agent_id.clone(),
                );
                new_state.private.agenda.push_back(response);
            } else {
                new_state.control.next_speaker = "user".to_string();
            }
            new_state.shared.push_last_move(dialogue_move);
            new_state
        },
    )
    .with_priority(7)
}

pub fn integrate_quit() -> UpdateRule {
    UpdateRule::new(
        "integrate_quit",
        RulePhase::Integration,
        |_, ctx| is_move(ctx, MoveType::Quit),
        |state, ctx| {
            let mut new_state = state.clone();
            let Some(dialogue_move) = current_move(ctx).cloned() else {
                return new_state;
            };
            new_state.control.dialogue_state = DialogueState::Ended;
            if dialogue_move.speaker != new_state.agent_id {
                new_state.control.next_speaker = new_state.agent_id.clone();
                let response = DialogueMove::new(
                    MoveType::Quit,
                    "quit_response",
                    new_state.agent_id.clone(),
                );
                new_state.private.agenda.push_back(response);
            } else {
                new_state.control.next_speaker = "user".to_string();
            }
            new_state.shared.push_last_move(dialogue_move);
            new_state
        },
    )
    .with_priority(7)
}
