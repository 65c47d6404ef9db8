//! IBiS-4 negotiation rules: information under negotiation (IUN),
//! accept/reject handling, and alternative accommodation.
//!
//! All three are integration-phase rules. Counter-proposal generation is a
//! selection rule and lives in [`crate::rules::selection`].

use crate::rules::context::TurnContext;
use crate::rules::update_rule::{RulePhase, UpdateRule};
use ibis_domain::{ContentValue, DialogueMove, MoveType, Proposition};
use tracing::debug;

fn current_move(context: &TurnContext) -> Option<&DialogueMove> {
    context.current_move.as_ref()
}

fn asserted_proposition(context: &TurnContext) -> Option<&Proposition> {
    current_move(context)
        .filter(|m| m.move_type == MoveType::Assert)
        .and_then(|m| m.content.as_proposition())
}

fn answer_polarity(context: &TurnContext) -> Option<bool> {
    let answer = current_move(context)
        .filter(|m| m.move_type == MoveType::Answer)?
        .content
        .as_answer()?;
    if answer.is_affirmative() {
        Some(true)
    } else if answer.is_negative() {
        Some(false)
    } else {
        None
    }
}

/// Propositions offered as alternatives in the move's metadata.
fn metadata_alternatives(dialogue_move: &DialogueMove) -> Vec<Proposition> {
    dialogue_move
        .metadata
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

/// Accommodate asserted alternatives into IUN: a proposition conflicting
/// with an existing commitment, or any alternatives carried in the move's
/// metadata. Propositions already committed never enter IUN.
pub fn accommodate_alternative() -> UpdateRule {
    UpdateRule::new(
        "accommodate_alternative",
        RulePhase::Integration,
        |state, ctx| {
            let Some(dialogue_move) = current_move(ctx) else {
                return false;
            };
            let Some(proposition) = asserted_proposition(ctx) else {
                return false;
            };
            proposition.conflicts_with_commitments(&state.shared.commitments)
                || !metadata_alternatives(dialogue_move).is_empty()
        },
        |state, ctx| {
            let mut new_state = state.clone();
            let Some(dialogue_move) = current_move(ctx).cloned() else {
                return new_state;
            };
            let mut offered = metadata_alternatives(&dialogue_move);
            if let Some(proposition) = dialogue_move.content.as_proposition() {
                offered.push(proposition.clone());
            }
            for proposition in offered {
                let committed = new_state
                    .shared
                    .commitments
                    .contains(&proposition.to_string());
                if !committed {
                    debug!(proposition = %proposition, "accommodated alternative to IUN");
                    new_state.private.iun.insert(proposition);
                }
            }
            new_state.control.next_speaker = new_state.agent_id.clone();
            new_state.shared.push_last_move(dialogue_move);
            new_state
        },
    )
    .with_priority(9)
}

/// Accept negotiation proposals: a bare "yes" commits everything under
/// negotiation; asserting a specific IUN proposition commits only that one
/// and leaves the rest on the table.
pub fn accept_proposal() -> UpdateRule {
    UpdateRule::new(
        "accept_proposal",
        RulePhase::Integration,
        |state, ctx| {
            if state.private.iun.is_empty() {
                return false;
            }
            if answer_polarity(ctx) == Some(true) {
                return true;
            }
            asserted_proposition(ctx)
                .is_some_and(|p| state.private.iun.iter().any(|iun| iun.matches(p)))
        },
        |state, ctx| {
            let mut new_state = state.clone();
            if answer_polarity(ctx) == Some(true) {
                for proposition in std::mem::take(&mut new_state.private.iun) {
                    debug!(proposition = %proposition, "accepted proposal");
                    new_state.shared.commit(proposition.to_string());
                }
                return new_state;
            }
            if let Some(accepted) = asserted_proposition(ctx).cloned() {
                new_state.private.iun.retain(|iun| !iun.matches(&accepted));
                debug!(proposition = %accepted, "accepted specific proposal");
                new_state.shared.commit(accepted.to_string());
            }
            new_state
        },
    )
    .with_priority(9)
}

/// Reject negotiation proposals: a bare "no" clears IUN; asserting a
/// specific proposition with `rejection_detected` metadata removes only
/// that one, leaving the rejected proposition on the move for the
/// counter-proposal selection rule.
pub fn reject_proposal() -> UpdateRule {
    UpdateRule::new(
        "reject_proposal",
        RulePhase::Integration,
        |state, ctx| {
            if state.private.iun.is_empty() {
                return false;
            }
            if answer_polarity(ctx) == Some(false) {
                return true;
            }
            current_move(ctx).is_some_and(|m| {
                m.metadata
                    .get("rejection_detected")
                    .and_then(ContentValue::as_bool)
                    .unwrap_or(false)
            }) && asserted_proposition(ctx)
                .is_some_and(|p| state.private.iun.iter().any(|iun| iun.matches(p)))
        },
        |state, ctx| {
            let mut new_state = state.clone();
            if answer_polarity(ctx) == Some(false) {
                debug!(count = new_state.private.iun.len(), "rejected all proposals");
                new_state.private.iun.clear();
                return new_state;
            }
            if let Some(rejected) = asserted_proposition(ctx).cloned() {
                debug!(proposition = %rejected, "rejected specific proposal");
                new_state.private.iun.retain(|iun| !iun.matches(&rejected));
            }
            new_state
        },
    )
    .with_priority(9)
}
