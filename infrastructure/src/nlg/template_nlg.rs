//! Template-based implementation of the NLG port.
//!
//! Two strategies: `template` renders move-type templates, `plan_aware`
//! composes step-counting question announcements from the active task plan
//! and the domain's predicate descriptions. The adapter is stateless; the
//! strategy is chosen per move.

use async_trait::async_trait;
use ibis_application::ports::nlg::{NlgError, NlgPort, NlgResult};
use ibis_domain::{DialogueMove, DomainModel, InformationState, MoveType, Plan, Question};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Tunables for [`TemplateNlg`].
#[derive(Debug, Clone)]
pub struct TemplateNlgConfig {
    /// Use plan context when generating questions.
    pub use_plan_awareness: bool,
    /// Use the domain's predicate descriptions instead of raw signatures.
    pub use_domain_descriptions: bool,
}

impl Default for TemplateNlgConfig {
    fn default() -> Self {
        Self {
            use_plan_awareness: true,
            use_domain_descriptions: true,
        }
    }
}

/// Template implementation of the NLG port.
pub struct TemplateNlg {
    config: TemplateNlgConfig,
    domain: Option<Arc<DomainModel>>,
}

impl TemplateNlg {
    pub fn new(config: TemplateNlgConfig) -> Self {
        Self {
            config,
            domain: None,
        }
    }

    /// Attach a domain model for description lookups.
    pub fn with_domain(mut self, domain: Arc<DomainModel>) -> Self {
        self.domain = Some(domain);
        self
    }

    fn active_plan<'a>(&self, state: &'a InformationState) -> Option<&'a Plan> {
        state
            .private
            .plan
            .iter()
            .find(|plan| plan.is_active() && !plan.subplans.is_empty())
    }

    fn describe(&self, question: &Question) -> String {
        if self.config.use_domain_descriptions {
            if let Some(description) = question
                .predicate()
                .and_then(|p| self.domain.as_ref().and_then(|d| d.describe(p)))
            {
                return description.to_string();
            }
        }
        question.to_string()
    }

    fn plan_aware_question(&self, question: &Question, plan: &Plan) -> String {
        let (completed, total) = plan.subplan_progress();
        let step = (completed + 1).min(total.max(1));
        let description = self.describe(question);
        let description = description.trim_end_matches('?').trim_end();
        format!("[Step {} of {}] {}?", step, total, description)
    }

    fn template(&self, dialogue_move: &DialogueMove) -> (String, &'static str) {
        let content = dialogue_move.content.to_string();
        match dialogue_move.move_type {
            MoveType::Greet => {
                if dialogue_move.content.as_text() == Some("greeting_response") {
                    (
                        "Hello! How can I help you today?".to_string(),
                        "greet_response_template",
                    )
                } else {
                    ("Hello!".to_string(), "greet_template")
                }
            }
            MoveType::Quit => ("Goodbye!".to_string(), "quit_template"),
            MoveType::Command => (format!("I understand: {}", content), "command_template"),
            MoveType::Answer | MoveType::Assert => {
                let text = if content.ends_with(['.', '!', '?']) {
                    content
                } else {
                    format!("{}.", content)
                };
                (text, "statement_template")
            }
            MoveType::Ask => {
                let text = if content.ends_with('?') {
                    content
                } else {
                    format!("{}?", content)
                };
                (text, "ask_template")
            }
            _ => (content, "identity_template"),
        }
    }
}

impl Default for TemplateNlg {
    fn default() -> Self {
        Self::new(TemplateNlgConfig::default())
    }
}

#[async_trait]
impl NlgPort for TemplateNlg {
    async fn generate(
        &self,
        dialogue_move: &DialogueMove,
        state: &InformationState,
    ) -> Result<NlgResult, NlgError> {
        let started = Instant::now();

        let plan_aware = self.config.use_plan_awareness
            && dialogue_move.move_type == MoveType::Ask
            && dialogue_move.content.as_question().is_some()
            && self.active_plan(state).is_some();

        let (text, strategy, rule) = if plan_aware {
            let question = dialogue_move
                .content
                .as_question()
                .ok_or_else(|| NlgError::Generation("ask move without question".to_string()))?;
            let plan = self
                .active_plan(state)
                .ok_or_else(|| NlgError::Generation("no active plan".to_string()))?;
            (
                self.plan_aware_question(question, plan),
                "plan_aware",
                "plan_aware_question",
            )
        } else {
            let (text, rule) = self.template(dialogue_move);
            (text, "template", rule)
        };

        debug!(strategy, rule, "generated surface text");
        Ok(NlgResult::new(text, strategy)
            .with_generation_rule(rule)
            .with_latency(started.elapsed().as_secs_f64()))
    }
}
