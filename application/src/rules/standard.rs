//! Assembly of the standard rule library.

use crate::rules::update_rule::RuleSet;
use crate::rules::{generation, integration, interpretation, negotiation, selection};
use ibis_domain::DomainModel;
use std::sync::Arc;

/// Build the full standard rule set for a domain.
///
/// Rules with equal priority keep the insertion order below; in particular
/// `integrate_answer` runs before `accommodate_clarification` within the
/// same pass, and task-plan formation runs before issue accommodation.
pub fn standard_rule_set(domain: Arc<DomainModel>) -> RuleSet {
    let mut rules = RuleSet::new();

    // Interpretation (surface patterns, used without an external NLU)
    rules.add_rule(interpretation::interpret_task_request(domain.clone()));
    rules.add_rule(interpretation::interpret_greeting());
    rules.add_rule(interpretation::interpret_quit());
    rules.add_rule(interpretation::interpret_wh_question());
    rules.add_rule(interpretation::interpret_yn_question());
    rules.add_rule(interpretation::interpret_alt_question());
    rules.add_rule(interpretation::interpret_yn_answer());
    rules.add_rule(interpretation::interpret_answer());
    rules.add_rule(interpretation::interpret_assertion(domain.clone()));

    // Integration (Larsson's update algorithm + IBiS-4 negotiation)
    rules.add_rule(integration::form_task_plan(domain.clone()));
    rules.add_rule(integration::accommodate_findout_to_issues());
    rules.add_rule(integration::integrate_command());
    rules.add_rule(integration::integrate_request());
    rules.add_rule(integration::integrate_question());
    rules.add_rule(integration::integrate_answer(domain.clone()));
    rules.add_rule(integration::accommodate_clarification());
    rules.add_rule(negotiation::accommodate_alternative());
    rules.add_rule(negotiation::accept_proposal());
    rules.add_rule(negotiation::reject_proposal());
    rules.add_rule(integration::integrate_assertion());
    rules.add_rule(integration::integrate_greet());
    rules.add_rule(integration::integrate_quit());

    // Selection
    rules.add_rule(selection::drain_agenda());
    rules.add_rule(selection::raise_issue_to_qud());
    rules.add_rule(selection::respond_to_top_qud());
    rules.add_rule(selection::generate_counter_proposal(domain.clone()));

    // Generation
    rules.add_rule(generation::generate_clarification_ask());
    rules.add_rule(generation::generate_plan_aware_ask(domain));

    rules
}
