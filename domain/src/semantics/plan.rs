//! Task plans and findout subplans.

use crate::semantics::content::ContentValue;
use crate::semantics::question::Question;
use serde::{Deserialize, Serialize};

/// The kind of a plan node.
///
/// `findout`, `raise`, `respond`, and `exec` are the engine-level kinds;
/// task roots (e.g. `nda_drafting`) are domain-declared and carried as
/// [`PlanType::Task`]. Serializes as a bare string either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlanType {
    /// Obtain an answer to the content question.
    Findout,
    /// Raise the content question without requiring an answer.
    Raise,
    /// Respond to the content question.
    Respond,
    /// Execute a domain action.
    Exec,
    /// A domain task root.
    Task(String),
}

impl PlanType {
    pub fn as_str(&self) -> &str {
        match self {
            PlanType::Findout => "findout",
            PlanType::Raise => "raise",
            PlanType::Respond => "respond",
            PlanType::Exec => "exec",
            PlanType::Task(name) => name,
        }
    }

    /// The task name when this is a domain task root.
    pub fn task_name(&self) -> Option<&str> {
        match self {
            PlanType::Task(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for PlanType {
    fn from(s: &str) -> Self {
        match s {
            "findout" => PlanType::Findout,
            "raise" => PlanType::Raise,
            "respond" => PlanType::Respond,
            "exec" => PlanType::Exec,
            other => PlanType::Task(other.to_string()),
        }
    }
}

impl From<String> for PlanType {
    fn from(s: String) -> Self {
        PlanType::from(s.as_str())
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for PlanType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PlanType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(PlanType::from(s))
    }
}

/// Lifecycle status of a plan node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    #[default]
    Active,
    Completed,
    Failed,
    Pending,
}

fn empty_content() -> ContentValue {
    ContentValue::empty()
}

/// A plan node — a task root or one of its steps.
///
/// Subplans are owned values, so a plan is always a tree; cross-references
/// to questions elsewhere in the state go through structural equality, never
/// back-pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_type: PlanType,
    #[serde(default = "empty_content")]
    pub content: ContentValue,
    #[serde(default)]
    pub status: PlanStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subplans: Vec<Plan>,
}

impl Plan {
    pub fn new(plan_type: impl Into<PlanType>, content: impl Into<ContentValue>) -> Self {
        Self {
            plan_type: plan_type.into(),
            content: content.into(),
            status: PlanStatus::Active,
            subplans: Vec::new(),
        }
    }

    /// A findout step for the given question.
    pub fn findout(question: Question) -> Self {
        Self::new(PlanType::Findout, question)
    }

    pub fn with_subplans(mut self, subplans: Vec<Plan>) -> Self {
        self.subplans = subplans;
        self
    }

    pub fn with_status(mut self, status: PlanStatus) -> Self {
        self.status = status;
        self
    }

    /// Active and pending plans both count as live work.
    pub fn is_active(&self) -> bool {
        matches!(self.status, PlanStatus::Active | PlanStatus::Pending)
    }

    pub fn complete(&mut self) {
        self.status = PlanStatus::Completed;
    }

    pub fn fail(&mut self) {
        self.status = PlanStatus::Failed;
    }

    /// The content question, when this node carries one.
    pub fn question(&self) -> Option<&Question> {
        self.content.as_question()
    }

    /// Questions of all still-active findout nodes, in subplan order.
    pub fn active_findout_questions(&self) -> Vec<&Question> {
        let mut questions = Vec::new();
        self.collect_active_findouts(&mut questions);
        questions
    }

    fn collect_active_findouts<'a>(&'a self, out: &mut Vec<&'a Question>) {
        if self.plan_type == PlanType::Findout && self.is_active() {
            if let Some(q) = self.question() {
                out.push(q);
            }
        }
        for subplan in &self.subplans {
            subplan.collect_active_findouts(out);
        }
    }

    /// `(completed, total)` over the direct subplans.
    pub fn subplan_progress(&self) -> (usize, usize) {
        let completed = self
            .subplans
            .iter()
            .filter(|p| p.status == PlanStatus::Completed)
            .count();
        (completed, self.subplans.len())
    }

    /// Mark the findout node for `question` completed, anywhere in the tree.
    ///
    /// Returns true if a node was completed. Used when a commitment resolves
    /// the question.
    pub fn complete_findout_for(&mut self, question: &Question) -> bool {
        if self.plan_type == PlanType::Findout
            && self.is_active()
            && self.question() == Some(question)
        {
            self.complete();
            return true;
        }
        self.subplans
            .iter_mut()
            .any(|subplan| subplan.complete_findout_for(question))
    }

    /// Mark the exec node for `action_name` completed, anywhere in the
    /// tree. Returns true if a node was completed.
    pub fn complete_exec_for(&mut self, action_name: &str) -> bool {
        if self.plan_type == PlanType::Exec
            && self.is_active()
            && self.content.as_text() == Some(action_name)
        {
            self.complete();
            return true;
        }
        self.subplans
            .iter_mut()
            .any(|subplan| subplan.complete_exec_for(action_name))
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (completed, total) = self.subplan_progress();
        if total > 0 {
            write!(f, "{}[{}/{}]", self.plan_type, completed, total)
        } else {
            write!(f, "{}({})", self.plan_type, self.content)
        }
    }
}
