//! Surface-pattern interpretation rules.
//!
//! Used when no external NLU collaborator is supplied: each rule matches
//! the raw utterance in the turn context and appends a recognized move to
//! [`TurnContext::produced_moves`]. The state is never modified here.
//!
//! Interpretation applies every rule whose precondition holds, so the
//! preconditions are written to be mutually exclusive: an utterance gets
//! exactly one reading. Alternative questions win over yes/no and
//! wh-readings ("Is it California or Delaware?" is one alt question, not
//! an alt question plus a yes/no question), and a salutation-only
//! utterance stays a greeting while a greeting with propositional residue
//! answers the open question instead.
//!
//! The wh-word list, auxiliary verbs, and yes/no vocabulary below are
//! surface-language constants; everything domain-specific goes through the
//! [`DomainModel`].

use crate::rules::context::TurnContext;
use crate::rules::update_rule::{RulePhase, UpdateRule};
use ibis_domain::semantics::question;
use ibis_domain::{
    Answer, ContentValue, DialogueMove, DomainModel, InformationState, MoveType, Question,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

const GREETING_PHRASES: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "greetings",
    "good morning",
    "good afternoon",
];
// Tokens that may accompany a salutation without making it contentful.
const GREETING_FILLER: &[&str] = &["there", "everyone", "all", "again", "you"];
const QUIT_PHRASES: &[&str] = &["bye", "goodbye", "quit", "exit", "see you"];
const WH_WORDS: &[&str] = &["what", "where", "when", "who", "why", "how", "which"];
const AUXILIARIES: &[&str] = &[
    "is", "are", "was", "were", "do", "does", "did", "can", "could", "will", "would", "should",
    "may", "might",
];
const YN_WORDS: &[&str] = &["yes", "no", "yeah", "nope", "yep", "nah", "true", "false"];

/// Word-boundary containment: single words match tokens, multi-word phrases
/// match as substrings.
fn contains_phrase(utterance: &str, phrase: &str) -> bool {
    let lowered = utterance.to_lowercase();
    if phrase.contains(' ') {
        return lowered.contains(phrase);
    }
    lowered
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .any(|token| token == phrase)
}

fn is_greeting(utterance: &str) -> bool {
    GREETING_PHRASES.iter().any(|p| contains_phrase(utterance, p))
}

/// Whether the utterance is a salutation only: every token is a greeting
/// word or filler, with no propositional residue.
fn is_pure_greeting(utterance: &str) -> bool {
    if !is_greeting(utterance) {
        return false;
    }
    let mut lowered = utterance.to_lowercase();
    for phrase in GREETING_PHRASES.iter().filter(|p| p.contains(' ')) {
        lowered = lowered.replace(phrase, " ");
    }
    lowered
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|token| !token.is_empty())
        .all(|token| GREETING_PHRASES.contains(&token) || GREETING_FILLER.contains(&token))
}

fn is_quit(utterance: &str) -> bool {
    QUIT_PHRASES.iter().any(|p| contains_phrase(utterance, p))
}

fn leading_wh_word(utterance: &str) -> Option<&'static str> {
    let lowered = utterance.trim().trim_end_matches('?').trim().to_lowercase();
    WH_WORDS
        .iter()
        .find(|wh| lowered == **wh || lowered.starts_with(&format!("{} ", wh)))
        .copied()
}

// Alternative questions usually open with a wh-word or auxiliary too
// ("Is it California or Delaware?"); the alt reading wins, so the yn and
// wh checks yield to it.
fn is_wh_question(utterance: &str) -> bool {
    leading_wh_word(utterance).is_some() && !is_alt_question(utterance)
}

fn is_yn_question(utterance: &str) -> bool {
    let trimmed = utterance.trim();
    if !trimmed.ends_with('?') || is_alt_question(utterance) {
        return false;
    }
    let lowered = trimmed.to_lowercase();
    AUXILIARIES
        .iter()
        .any(|aux| lowered.starts_with(&format!("{} ", aux)))
}

fn is_alt_question(utterance: &str) -> bool {
    let trimmed = utterance.trim();
    trimmed.ends_with('?') && trimmed.to_lowercase().contains(" or ")
}

fn is_yn_answer(utterance: &str) -> bool {
    let lowered = utterance.trim().to_lowercase();
    if YN_WORDS.contains(&lowered.as_str()) {
        return true;
    }
    lowered.split_whitespace().count() <= 2
        && YN_WORDS
            .iter()
            .any(|word| contains_phrase(&lowered, word))
}

fn is_plain_answer(state: &InformationState, utterance: &str) -> bool {
    if state.shared.qud.is_empty() || utterance.is_empty() {
        return false;
    }
    if is_yn_answer(utterance) || is_pure_greeting(utterance) || utterance.trim().ends_with('?') {
        return false;
    }
    utterance.split_whitespace().count() <= 20
}

fn produced(state: &InformationState, context: &mut TurnContext, dialogue_move: DialogueMove) -> InformationState {
    context.produced_moves.push(dialogue_move);
    state.clone()
}

/// Recognize task requests via the domain's registered trigger phrases and
/// emit a `request` move carrying the matched task as metadata. Plan
/// formation itself happens in the integration phase.
pub fn interpret_task_request(domain: Arc<DomainModel>) -> UpdateRule {
    let matcher = domain.clone();
    UpdateRule::new(
        "interpret_task_request",
        RulePhase::Interpretation,
        move |_, ctx| matcher.match_task(ctx.utterance_text()).is_some(),
        move |state, ctx| {
            let utterance = ctx.utterance_text().to_string();
            let Some(task) = domain.match_task(&utterance) else {
                return state.clone();
            };
            let dialogue_move =
                DialogueMove::new(MoveType::Request, utterance.clone(), ctx.speaker_id())
                    .with_metadata("task_type", task)
                    .with_metadata("intent", "task_request");
            produced(state, ctx, dialogue_move)
        },
    )
    .with_priority(12)
}

pub fn interpret_greeting() -> UpdateRule {
    UpdateRule::new(
        "interpret_greeting",
        RulePhase::Interpretation,
        // A greeting wrapped around real content ("hey, Acme Corp") while a
        // question is open reads as the answer, not as a greeting.
        |state, ctx| {
            let utterance = ctx.utterance_text();
            is_greeting(utterance)
                && (is_pure_greeting(utterance) || !is_plain_answer(state, utterance))
        },
        |state, ctx| {
            let dialogue_move = DialogueMove::new(
                MoveType::Greet,
                ctx.utterance_text().to_string(),
                ctx.speaker_id(),
            );
            produced(state, ctx, dialogue_move)
        },
    )
    .with_priority(10)
}

pub fn interpret_quit() -> UpdateRule {
    UpdateRule::new(
        "interpret_quit",
        RulePhase::Interpretation,
        |_, ctx| is_quit(ctx.utterance_text()),
        |state, ctx| {
            let dialogue_move = DialogueMove::new(
                MoveType::Quit,
                ctx.utterance_text().to_string(),
                ctx.speaker_id(),
            );
            produced(state, ctx, dialogue_move)
        },
    )
    .with_priority(10)
}

pub fn interpret_wh_question() -> UpdateRule {
    UpdateRule::new(
        "interpret_wh_question",
        RulePhase::Interpretation,
        |_, ctx| is_wh_question(ctx.utterance_text()),
        |state, ctx| {
            let utterance = ctx.utterance_text();
            let Some(wh_word) = leading_wh_word(utterance) else {
                return state.clone();
            };
            let mut predicate = utterance
                .trim_end_matches('?')
                .trim()
                .to_string();
            let lowered = predicate.to_lowercase();
            if let Some(rest) = lowered.strip_prefix(wh_word) {
                let offset = predicate.len() - rest.len();
                predicate = predicate[offset..].trim().to_string();
            }
            if predicate.is_empty() {
                predicate = wh_word.to_string();
            }
            let mut constraints = BTreeMap::new();
            constraints.insert(
                question::CONSTRAINT_WH_WORD.to_string(),
                ContentValue::from(wh_word),
            );
            let Ok(question) = Question::wh_with_constraints("x", predicate, constraints) else {
                return state.clone();
            };
            let dialogue_move = DialogueMove::new(MoveType::Ask, question, ctx.speaker_id());
            produced(state, ctx, dialogue_move)
        },
    )
    .with_priority(8)
}

pub fn interpret_yn_question() -> UpdateRule {
    UpdateRule::new(
        "interpret_yn_question",
        RulePhase::Interpretation,
        |_, ctx| is_yn_question(ctx.utterance_text()),
        |state, ctx| {
            let proposition = ctx
                .utterance_text()
                .trim_end_matches('?')
                .trim()
                .to_string();
            let Ok(question) = Question::yn(proposition) else {
                return state.clone();
            };
            let dialogue_move = DialogueMove::new(MoveType::Ask, question, ctx.speaker_id());
            produced(state, ctx, dialogue_move)
        },
    )
    .with_priority(7)
}

pub fn interpret_alt_question() -> UpdateRule {
    let splitter = Regex::new(r"(?i)\s+or\s+").expect("static pattern");
    UpdateRule::new(
        "interpret_alt_question",
        RulePhase::Interpretation,
        |_, ctx| is_alt_question(ctx.utterance_text()),
        move |state, ctx| {
            let text = ctx.utterance_text().trim_end_matches('?').trim();
            let alternatives: Vec<String> = splitter
                .split(text)
                .map(|alt| alt.trim().to_string())
                .filter(|alt| !alt.is_empty())
                .collect();
            let Ok(question) = Question::alt(alternatives) else {
                return state.clone();
            };
            let dialogue_move = DialogueMove::new(MoveType::Ask, question, ctx.speaker_id());
            produced(state, ctx, dialogue_move)
        },
    )
    .with_priority(7)
}

pub fn interpret_yn_answer() -> UpdateRule {
    UpdateRule::new(
        "interpret_yn_answer",
        RulePhase::Interpretation,
        |_, ctx| is_yn_answer(ctx.utterance_text()),
        |state, ctx| {
            let lowered = ctx.utterance_text().to_lowercase();
            let positive = ["yes", "yeah", "yep", "true"]
                .iter()
                .any(|word| contains_phrase(&lowered, word));
            let mut answer = Answer::new(positive);
            if let Some(top) = state.shared.top_qud() {
                answer = answer.for_question(top.clone());
            }
            let dialogue_move = DialogueMove::new(MoveType::Answer, answer, ctx.speaker_id());
            produced(state, ctx, dialogue_move)
        },
    )
    .with_priority(6)
}

pub fn interpret_answer() -> UpdateRule {
    UpdateRule::new(
        "interpret_answer",
        RulePhase::Interpretation,
        |state, ctx| is_plain_answer(state, ctx.utterance_text()),
        |state, ctx| {
            let mut answer = Answer::new(ctx.utterance_text().to_string());
            if let Some(top) = state.shared.top_qud() {
                answer = answer.for_question(top.clone());
            }
            let dialogue_move = DialogueMove::new(MoveType::Answer, answer, ctx.speaker_id());
            produced(state, ctx, dialogue_move)
        },
    )
    .with_priority(5)
}

/// Catch-all: anything not recognized above becomes an assertion.
pub fn interpret_assertion(domain: Arc<DomainModel>) -> UpdateRule {
    UpdateRule::new(
        "interpret_assertion",
        RulePhase::Interpretation,
        move |state, ctx| {
            let utterance = ctx.utterance_text();
            !utterance.is_empty()
                && domain.match_task(utterance).is_none()
                && !is_greeting(utterance)
                && !is_quit(utterance)
                && !is_wh_question(utterance)
                && !is_yn_question(utterance)
                && !is_alt_question(utterance)
                && !is_yn_answer(utterance)
                && !is_plain_answer(state, utterance)
        },
        |state, ctx| {
            let dialogue_move = DialogueMove::new(
                MoveType::Assert,
                ctx.utterance_text().to_string(),
                ctx.speaker_id(),
            );
            produced(state, ctx, dialogue_move)
        },
    )
    .with_priority(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_domain() -> Arc<DomainModel> {
        Arc::new(DomainModel::new("test"))
    }

    fn nda_domain() -> Arc<DomainModel> {
        let mut domain = DomainModel::new("legal");
        domain.add_task_trigger(
            "nda_drafting",
            vec!["draft an nda".to_string(), "draft nda".to_string()],
        );
        domain
            .register_plan_builder("nda_drafting", |_| ibis_domain::Plan::new("nda_drafting", ""));
        Arc::new(domain)
    }

    fn run(rule: &UpdateRule, state: &InformationState, utterance: &str) -> Vec<DialogueMove> {
        let mut ctx = TurnContext::for_utterance(utterance, "user");
        if rule.applies(state, &ctx) {
            rule.apply(state, &mut ctx);
        }
        ctx.produced_moves
    }

    #[test]
    fn test_greeting() {
        let state = InformationState::new("system");
        let moves = run(&interpret_greeting(), &state, "Hello there");
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].move_type, MoveType::Greet);
        // "which" must not read as "hi"
        assert!(run(&interpret_greeting(), &state, "which option?").is_empty());
    }

    #[test]
    fn test_quit() {
        let state = InformationState::new("system");
        let moves = run(&interpret_quit(), &state, "goodbye");
        assert_eq!(moves[0].move_type, MoveType::Quit);
    }

    #[test]
    fn test_wh_question_strips_wh_word() {
        let state = InformationState::new("system");
        let moves = run(&interpret_wh_question(), &state, "What is the effective date?");
        assert_eq!(moves.len(), 1);
        let question = moves[0].content.as_question().unwrap();
        assert_eq!(question.predicate(), Some("is the effective date"));
        assert_eq!(
            question.constraint("wh_word").and_then(ContentValue::as_text),
            Some("what")
        );
    }

    #[test]
    fn test_yn_question() {
        let state = InformationState::new("system");
        let moves = run(&interpret_yn_question(), &state, "Is it raining?");
        let question = moves[0].content.as_question().unwrap();
        assert_eq!(question.predicate(), Some("Is it raining"));
        assert!(run(&interpret_yn_question(), &state, "Is it raining").is_empty());
    }

    #[test]
    fn test_alt_question_splits_on_or() {
        let state = InformationState::new("system");
        let moves = run(&interpret_alt_question(), &state, "California or Delaware?");
        let question = moves[0].content.as_question().unwrap();
        assert_eq!(
            question.alternatives(),
            Some(&["California".to_string(), "Delaware".to_string()][..])
        );
    }

    #[test]
    fn test_alt_reading_wins_over_yn() {
        let state = InformationState::new("system");
        let utterance = "Is it California or Delaware?";
        assert!(run(&interpret_yn_question(), &state, utterance).is_empty());

        let moves = run(&interpret_alt_question(), &state, utterance);
        assert_eq!(moves.len(), 1);
        let question = moves[0].content.as_question().unwrap();
        assert_eq!(question.alternatives().map(<[String]>::len), Some(2));
    }

    #[test]
    fn test_alt_reading_wins_over_wh() {
        let state = InformationState::new("system");
        let utterance = "Which is better, California or Delaware?";
        assert!(run(&interpret_wh_question(), &state, utterance).is_empty());

        let moves = run(&interpret_alt_question(), &state, utterance);
        assert_eq!(moves.len(), 1);
    }

    #[test]
    fn test_yn_answer_references_top_qud() {
        let mut state = InformationState::new("system");
        let q = Question::yn("generate_document").unwrap();
        state.shared.push_qud(q.clone());

        let moves = run(&interpret_yn_answer(), &state, "yes");
        let answer = moves[0].content.as_answer().unwrap();
        assert_eq!(answer.content, ContentValue::Bool(true));
        assert_eq!(answer.question_ref.as_ref(), Some(&q));

        let moves = run(&interpret_yn_answer(), &state, "nope");
        assert_eq!(
            moves[0].content.as_answer().unwrap().content,
            ContentValue::Bool(false)
        );
    }

    #[test]
    fn test_greeting_with_content_answers_open_question() {
        let mut state = InformationState::new("system");
        state
            .shared
            .push_qud(Question::wh("x", "legal_entities").unwrap());

        assert!(run(&interpret_greeting(), &state, "hey, Acme Corp").is_empty());
        let moves = run(&interpret_answer(), &state, "hey, Acme Corp");
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].move_type, MoveType::Answer);
    }

    #[test]
    fn test_pure_greeting_stays_a_greeting_under_open_qud() {
        let mut state = InformationState::new("system");
        state
            .shared
            .push_qud(Question::wh("x", "legal_entities").unwrap());

        let moves = run(&interpret_greeting(), &state, "hi there");
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].move_type, MoveType::Greet);
        assert!(run(&interpret_answer(), &state, "hi there").is_empty());
    }

    #[test]
    fn test_plain_answer_requires_open_qud() {
        let mut state = InformationState::new("system");
        assert!(run(&interpret_answer(), &state, "Acme Corp").is_empty());

        state
            .shared
            .push_qud(Question::wh("x", "legal_entities").unwrap());
        let moves = run(&interpret_answer(), &state, "Acme Corp");
        assert_eq!(moves[0].move_type, MoveType::Answer);
        assert_eq!(
            moves[0].content.as_answer().unwrap().content.as_text(),
            Some("Acme Corp")
        );
    }

    #[test]
    fn test_task_request_carries_task_metadata() {
        let domain = nda_domain();
        let state = InformationState::new("system");
        let rule = interpret_task_request(domain);
        let moves = run(&rule, &state, "I need to draft an NDA");
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].move_type, MoveType::Request);
        assert_eq!(
            moves[0].metadata.get("task_type").and_then(ContentValue::as_text),
            Some("nda_drafting")
        );
    }

    #[test]
    fn test_assertion_is_the_fallback() {
        let state = InformationState::new("system");
        let rule = interpret_assertion(empty_domain());
        let moves = run(&rule, &state, "The weather is nice today");
        assert_eq!(moves[0].move_type, MoveType::Assert);

        // Not a fallback for recognized forms or empty input
        assert!(run(&rule, &state, "hello").is_empty());
        assert!(run(&rule, &state, "").is_empty());
    }

    #[test]
    fn test_assertion_excludes_task_requests() {
        let state = InformationState::new("system");
        let rule = interpret_assertion(nda_domain());
        assert!(run(&rule, &state, "please draft an NDA for us").is_empty());
    }
}
