//! Selection rules: choose at most one next move for the agent.
//!
//! The agenda always wins; otherwise issues are raised to the QUD on
//! demand (Rule 4.2), open questions are asked, and rejections trigger
//! counter-proposals (IBiS-4).

use crate::rules::context::TurnContext;
use crate::rules::update_rule::{RulePhase, UpdateRule};
use ibis_domain::{
    ContentValue, DialogueMove, DomainModel, InformationState, MoveType, Proposition,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Produce the first pending agenda move.
pub fn drain_agenda() -> UpdateRule {
    UpdateRule::new(
        "drain_agenda",
        RulePhase::Selection,
        |state, _| !state.private.agenda.is_empty(),
        |state, ctx| {
            let mut new_state = state.clone();
            if let Some(dialogue_move) = new_state.private.agenda.pop_front() {
                debug!(move_type = %dialogue_move.move_type, "drained agenda move");
                ctx.response_move = Some(dialogue_move);
                new_state.control.next_speaker = new_state.other_agent(&new_state.agent_id);
            }
            new_state
        },
    )
    .with_priority(20)
}

/// Rule 4.2 (local question accommodation): when nothing is under
/// discussion, raise the first private issue onto the QUD and ask it.
pub fn raise_issue_to_qud() -> UpdateRule {
    UpdateRule::new(
        "raise_issue_to_qud",
        RulePhase::Selection,
        |state, _| !state.private.issues.is_empty() && state.shared.qud.is_empty(),
        |state, ctx| {
            let mut new_state = state.clone();
            if new_state.private.issues.is_empty() {
                return new_state;
            }
            let question = new_state.private.issues.remove(0);
            debug!(issue = %question, "raised issue to QUD");
            new_state.shared.push_qud(question.clone());
            ctx.response_move = Some(DialogueMove::new(
                MoveType::Ask,
                question,
                new_state.agent_id.clone(),
            ));
            new_state
        },
    )
    .with_priority(12)
}

/// Whether this agent has already asked `question` on the record.
fn already_asked(state: &InformationState, question: &ibis_domain::Question) -> bool {
    state.shared.moves.iter().any(|m| {
        m.move_type == MoveType::Ask
            && m.speaker == state.agent_id
            && m.content.as_question() == Some(question)
    })
}

/// Ask the top QUD question when it was raised by the other party and this
/// agent has not asked it yet.
pub fn respond_to_top_qud() -> UpdateRule {
    UpdateRule::new(
        "respond_to_top_qud",
        RulePhase::Selection,
        |state, _| {
            state
                .shared
                .top_qud()
                .is_some_and(|top| !already_asked(state, top))
        },
        |state, _| {
            let mut new_state = state.clone();
            let Some(top) = new_state.shared.top_qud().cloned() else {
                return new_state;
            };
            let ask = DialogueMove::new(MoveType::Ask, top, new_state.agent_id.clone());
            new_state.private.agenda.push_back(ask);
            new_state
        },
    )
    .with_priority(10)
}

/// The proposition the last move rejected, if any.
fn rejected_proposition(state: &InformationState) -> Option<Proposition> {
    let last = state.private.last_utterance.as_ref()?;
    if let Some(rejected) = last
        .metadata
        .get("rejected_proposition")
        .and_then(ContentValue::as_proposition)
    {
        return Some(rejected.clone());
    }
    let detected = last
        .metadata
        .get("rejection_detected")
        .and_then(ContentValue::as_bool)
        .unwrap_or(false);
    if detected {
        return last.content.as_proposition().cloned();
    }
    None
}

/// Known alternatives held in the private belief store.
fn known_alternatives(state: &InformationState) -> BTreeSet<Proposition> {
    state
        .private
        .beliefs
        .get("alternatives")
        .and_then(ContentValue::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(ContentValue::as_proposition)
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// IBiS-4 counter-proposal: after a rejection, offer an alternative that
/// dominates the rejected proposition.
pub fn generate_counter_proposal(domain: Arc<DomainModel>) -> UpdateRule {
    let checker = domain.clone();
    UpdateRule::new(
        "generate_counter_proposal",
        RulePhase::Selection,
        move |state, _| {
            rejected_proposition(state).is_some_and(|rejected| {
                checker
                    .get_better_alternative(&rejected, &known_alternatives(state))
                    .is_some()
            })
        },
        move |state, _| {
            let mut new_state = state.clone();
            let Some(rejected) = rejected_proposition(&new_state) else {
                return new_state;
            };
            let Some(better) =
                domain.get_better_alternative(&rejected, &known_alternatives(&new_state))
            else {
                return new_state;
            };
            debug!(rejected = %rejected, counter = %better, "generated counter-proposal");
            let counter = DialogueMove::new(
                MoveType::Assert,
                better,
                new_state.agent_id.clone(),
            )
            .with_metadata("counter_proposal", true);
            new_state.private.agenda.push_back(counter);
            new_state
        },
    )
    .with_priority(8)
}
