//! Opt-in ICM grounding rules.
//!
//! Feedback on the perception/understanding channel per Larsson's
//! grounding model. These rules are not part of the standard set: hosts
//! that thread NLU confidence through move metadata add them explicitly
//! (`engine.rules_mut().add_rule(...)`).

use crate::rules::context::TurnContext;
use crate::rules::update_rule::{RulePhase, UpdateRule};
use ibis_domain::{DialogueMove, InformationState, MoveType};
use tracing::debug;

/// Default confidence below which perception feedback is requested.
pub const DEFAULT_PERCEPTION_THRESHOLD: f64 = 0.4;

fn last_user_move(state: &InformationState) -> Option<(usize, &DialogueMove)> {
    state
        .shared
        .moves
        .iter()
        .enumerate()
        .rev()
        .find(|(_, m)| m.speaker != state.agent_id)
}

/// `per*neg` feedback: when the last user move came in below the
/// confidence threshold and has not been queried yet, ask for repetition,
/// targeting the garbled move.
pub fn perception_feedback(threshold: f64) -> UpdateRule {
    let already_queried = |state: &InformationState, index: usize| {
        state.shared.moves.iter().any(|m| {
            m.is_icm() && m.speaker == state.agent_id && m.target_move_index == Some(index)
        })
    };
    UpdateRule::new(
        "perception_feedback",
        RulePhase::Selection,
        move |state, _| {
            last_user_move(state).is_some_and(|(index, m)| {
                m.confidence().is_some_and(|c| c < threshold) && !already_queried(state, index)
            })
        },
        move |state, ctx: &mut TurnContext| {
            let new_state = state.clone();
            if let Some((index, _)) = last_user_move(&new_state) {
                debug!(target = index, "requesting repetition");
                ctx.response_move = Some(
                    DialogueMove::icm_perception_negative("Pardon?", new_state.agent_id.clone())
                        .with_target(index),
                );
            }
            new_state
        },
    )
    .with_priority(15)
}

/// `und*pos` feedback: display understanding of a confidently heard answer
/// by echoing its content, targeting the heard move.
pub fn understanding_feedback(threshold: f64) -> UpdateRule {
    let already_echoed = |state: &InformationState, index: usize| {
        state.shared.moves.iter().any(|m| {
            m.is_icm() && m.speaker == state.agent_id && m.target_move_index == Some(index)
        })
    };
    UpdateRule::new(
        "understanding_feedback",
        RulePhase::Selection,
        move |state, _| {
            last_user_move(state).is_some_and(|(index, m)| {
                m.move_type == MoveType::Answer
                    && m.confidence().is_some_and(|c| c >= threshold)
                    && !already_echoed(state, index)
            })
        },
        move |state, ctx: &mut TurnContext| {
            let new_state = state.clone();
            if let Some((index, heard)) = last_user_move(&new_state) {
                let content = heard
                    .content
                    .as_answer()
                    .map(|a| a.content_text())
                    .unwrap_or_else(|| heard.content.to_string());
                ctx.response_move = Some(
                    DialogueMove::icm_understanding_positive(content, new_state.agent_id.clone())
                        .with_target(index),
                );
            }
            new_state
        },
    )
    .with_priority(14)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DialogueMoveEngine;
    use crate::rules::standard::standard_rule_set;
    use ibis_domain::{Answer, DomainModel, InformationState};
    use std::sync::Arc;

    fn engine_with_grounding() -> DialogueMoveEngine {
        let mut engine =
            DialogueMoveEngine::with_domain("system", Arc::new(DomainModel::new("test")));
        engine.rules_mut().add_rule(perception_feedback(DEFAULT_PERCEPTION_THRESHOLD));
        engine
    }

    #[test]
    fn test_low_confidence_answer_triggers_pardon() {
        let engine = engine_with_grounding();
        let state = InformationState::new("system");
        let garbled = DialogueMove::new(MoveType::Answer, Answer::new("[garbled]"), "user")
            .with_metadata("confidence", 0.2);
        let state = engine.integrate(&garbled, &state);

        let (response, state) = engine.select_action(&state);
        let pardon = response.unwrap();
        assert_eq!(pardon.icm_signature().as_deref(), Some("per*neg"));
        assert_eq!(pardon.target_move_index, Some(0));

        // Once the feedback is on the record, it is not repeated
        let state = engine.integrate(&pardon, &state);
        let (again, _) = engine.select_action(&state);
        assert!(again.is_none());
    }

    #[test]
    fn test_confident_move_triggers_no_pardon() {
        let engine = engine_with_grounding();
        let state = InformationState::new("system");
        let clear = DialogueMove::new(MoveType::Answer, Answer::new("Paris"), "user")
            .with_metadata("confidence", 0.95);
        let state = engine.integrate(&clear, &state);
        let (response, _) = engine.select_action(&state);
        assert!(response.is_none());
    }

    #[test]
    fn test_understanding_feedback_echoes_answer() {
        let mut rules = standard_rule_set(Arc::new(DomainModel::new("test")));
        rules.add_rule(understanding_feedback(0.9));
        let engine = DialogueMoveEngine::new("system", rules);

        let state = InformationState::new("system");
        let clear = DialogueMove::new(MoveType::Answer, Answer::new("Paris"), "user")
            .with_metadata("confidence", 0.95);
        let state = engine.integrate(&clear, &state);

        let (response, _) = engine.select_action(&state);
        let echo = response.unwrap();
        assert_eq!(echo.icm_signature().as_deref(), Some("und*pos"));
        assert_eq!(echo.content.as_text(), Some("Paris"));
        assert_eq!(echo.target_move_index, Some(0));
    }

    #[test]
    fn test_moves_without_confidence_are_left_alone() {
        let engine = engine_with_grounding();
        let state = InformationState::new("system");
        let plain = DialogueMove::new(MoveType::Assert, "the sky is blue", "user");
        let state = engine.integrate(&plain, &state);
        let (response, _) = engine.select_action(&state);
        assert!(response.is_none());
    }
}
