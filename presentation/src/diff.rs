//! Field-level diffs between state snapshots.

use crate::snapshot::StateSnapshot;
use ibis_domain::InformationState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a field changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Unchanged,
}

/// The change record for one state field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedField {
    pub field_name: String,
    pub change_type: ChangeType,
    #[serde(default)]
    pub added_items: Vec<String>,
    #[serde(default)]
    pub removed_items: Vec<String>,
    #[serde(default)]
    pub modified_items: Vec<(String, String)>,
    pub summary: String,
}

impl ChangedField {
    fn from_items(
        field_name: &str,
        added_items: Vec<String>,
        removed_items: Vec<String>,
        modified_items: Vec<(String, String)>,
    ) -> Option<Self> {
        let change_type = match (
            added_items.is_empty(),
            removed_items.is_empty(),
            modified_items.is_empty(),
        ) {
            (true, true, true) => return None,
            (false, true, true) => ChangeType::Added,
            (true, false, true) => ChangeType::Removed,
            _ => ChangeType::Modified,
        };
        let mut parts = Vec::new();
        if !added_items.is_empty() {
            parts.push(format!("+{}", added_items.len()));
        }
        if !removed_items.is_empty() {
            parts.push(format!("-{}", removed_items.len()));
        }
        if !modified_items.is_empty() {
            parts.push(format!("~{}", modified_items.len()));
        }
        Some(Self {
            field_name: field_name.to_string(),
            change_type,
            added_items,
            removed_items,
            modified_items,
            summary: format!("{} ({})", field_name, parts.join(", ")),
        })
    }
}

/// A field-by-field comparison of two snapshots.
///
/// Sequences (qud, issues, plan, agenda, moves, last_moves, next_moves)
/// and sets (commitments, iun) are compared element-wise on their printed
/// form; `beliefs` is compared key-wise; turn-control scalars are reported
/// as modifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDiff {
    pub before: StateSnapshot,
    pub after: StateSnapshot,
    pub changed_fields: BTreeMap<String, ChangedField>,
}

impl StateDiff {
    /// Compare two snapshots.
    pub fn compute(before: StateSnapshot, after: StateSnapshot) -> Self {
        let mut changed_fields = BTreeMap::new();
        let b = &before.state;
        let a = &after.state;

        let mut record = |field: Option<ChangedField>| {
            if let Some(field) = field {
                changed_fields.insert(field.field_name.clone(), field);
            }
        };

        record(diff_items(
            "qud",
            &render_all(&b.shared.qud),
            &render_all(&a.shared.qud),
        ));
        record(diff_items(
            "commitments",
            &b.shared.commitments.iter().cloned().collect::<Vec<_>>(),
            &a.shared.commitments.iter().cloned().collect::<Vec<_>>(),
        ));
        record(diff_items(
            "issues",
            &render_all(&b.private.issues),
            &render_all(&a.private.issues),
        ));
        record(diff_items(
            "plan",
            &render_all(&b.private.plan),
            &render_all(&a.private.plan),
        ));
        record(diff_items(
            "agenda",
            &render_all(&b.private.agenda),
            &render_all(&a.private.agenda),
        ));
        record(diff_items(
            "moves",
            &render_all(&b.shared.moves),
            &render_all(&a.shared.moves),
        ));
        record(diff_items(
            "last_moves",
            &render_all(&b.shared.last_moves),
            &render_all(&a.shared.last_moves),
        ));
        record(diff_items(
            "next_moves",
            &render_all(&b.shared.next_moves),
            &render_all(&a.shared.next_moves),
        ));
        record(diff_items(
            "iun",
            &render_all(&b.private.iun),
            &render_all(&a.private.iun),
        ));
        record(diff_beliefs(&b.private.beliefs, &a.private.beliefs));
        record(diff_scalar(
            "next_speaker",
            &b.control.next_speaker,
            &a.control.next_speaker,
        ));
        record(diff_scalar(
            "dialogue_state",
            b.control.dialogue_state.as_str(),
            a.control.dialogue_state.as_str(),
        ));

        Self {
            before,
            after,
            changed_fields,
        }
    }

    /// Convenience over [`compute`](Self::compute) for raw states.
    pub fn between(before: &InformationState, after: &InformationState) -> Self {
        Self::compute(
            StateSnapshot::from_state(before, 0, "before"),
            StateSnapshot::from_state(after, 0, "after"),
        )
    }

    pub fn has_changes(&self) -> bool {
        !self.changed_fields.is_empty()
    }

    pub fn changed_field_names(&self) -> Vec<&str> {
        self.changed_fields.keys().map(String::as_str).collect()
    }

    /// One-line human summary, e.g.
    /// `2 fields changed: commitments (+1), qud (-1)`.
    pub fn format_summary(&self) -> String {
        if self.changed_fields.is_empty() {
            return "no changes".to_string();
        }
        let summaries: Vec<&str> = self
            .changed_fields
            .values()
            .map(|f| f.summary.as_str())
            .collect();
        format!(
            "{} field{} changed: {}",
            self.changed_fields.len(),
            if self.changed_fields.len() == 1 { "" } else { "s" },
            summaries.join(", ")
        )
    }
}

fn render_all<'a, T, I>(items: I) -> Vec<String>
where
    T: std::fmt::Display + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

fn diff_items(field: &str, before: &[String], after: &[String]) -> Option<ChangedField> {
    let added = after
        .iter()
        .filter(|item| !before.contains(item))
        .cloned()
        .collect();
    let removed = before
        .iter()
        .filter(|item| !after.contains(item))
        .cloned()
        .collect();
    ChangedField::from_items(field, added, removed, Vec::new())
}

fn diff_beliefs(
    before: &BTreeMap<String, ibis_domain::ContentValue>,
    after: &BTreeMap<String, ibis_domain::ContentValue>,
) -> Option<ChangedField> {
    let added = after
        .iter()
        .filter(|(key, _)| !before.contains_key(*key))
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    let removed = before
        .iter()
        .filter(|(key, _)| !after.contains_key(*key))
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    let modified = before
        .iter()
        .filter_map(|(key, old)| {
            after
                .get(key)
                .filter(|new| *new != old)
                .map(|new| (format!("{}={}", key, old), format!("{}={}", key, new)))
        })
        .collect();
    ChangedField::from_items("beliefs", added, removed, modified)
}

fn diff_scalar(field: &str, before: &str, after: &str) -> Option<ChangedField> {
    if before == after {
        return None;
    }
    ChangedField::from_items(
        field,
        Vec::new(),
        Vec::new(),
        vec![(before.to_string(), after.to_string())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ibis_domain::{ContentValue, Question};

    #[test]
    fn test_no_changes() {
        let state = InformationState::new("system");
        let diff = StateDiff::between(&state, &state.clone());
        assert!(!diff.has_changes());
        assert_eq!(diff.format_summary(), "no changes");
    }

    #[test]
    fn test_added_commitment_and_popped_qud() {
        let mut before = InformationState::new("system");
        before.shared.push_qud(Question::wh("x", "destination").unwrap());

        let mut after = before.clone();
        after.shared.pop_qud();
        after.shared.commit("destination: Paris");

        let diff = StateDiff::between(&before, &after);
        assert!(diff.has_changes());
        assert_eq!(diff.changed_field_names(), vec!["commitments", "qud"]);

        let commitments = &diff.changed_fields["commitments"];
        assert_eq!(commitments.change_type, ChangeType::Added);
        assert_eq!(commitments.added_items, vec!["destination: Paris"]);

        let qud = &diff.changed_fields["qud"];
        assert_eq!(qud.change_type, ChangeType::Removed);
        assert_eq!(qud.removed_items, vec!["destination"]);
    }

    #[test]
    fn test_belief_modification() {
        let mut before = InformationState::new("system");
        before
            .private
            .beliefs
            .insert("document_type".to_string(), ContentValue::from("NDA"));

        let mut after = before.clone();
        after
            .private
            .beliefs
            .insert("document_type".to_string(), ContentValue::from("MSA"));
        after
            .private
            .beliefs
            .insert("domain".to_string(), ContentValue::from("legal"));

        let diff = StateDiff::between(&before, &after);
        let beliefs = &diff.changed_fields["beliefs"];
        assert_eq!(beliefs.change_type, ChangeType::Modified);
        assert_eq!(beliefs.added_items, vec!["domain=legal"]);
        assert_eq!(
            beliefs.modified_items,
            vec![("document_type=NDA".to_string(), "document_type=MSA".to_string())]
        );
    }

    #[test]
    fn test_scalar_control_changes() {
        let before = InformationState::new("system");
        let mut after = before.clone();
        after.control.next_speaker = "system".to_string();

        let diff = StateDiff::between(&before, &after);
        let field = &diff.changed_fields["next_speaker"];
        assert_eq!(field.change_type, ChangeType::Modified);
        assert_eq!(
            field.modified_items,
            vec![("user".to_string(), "system".to_string())]
        );
    }

    #[test]
    fn test_format_summary() {
        let before = InformationState::new("system");
        let mut after = before.clone();
        after.shared.commit("a");
        after.shared.commit("b");

        let diff = StateDiff::between(&before, &after);
        assert_eq!(diff.format_summary(), "1 field changed: commitments (+2)");
    }

    #[test]
    fn test_serde_roundtrip() {
        let before = InformationState::new("system");
        let mut after = before.clone();
        after.shared.commit("x");
        let diff = StateDiff::between(&before, &after);
        let json = serde_json::to_string(&diff).unwrap();
        let back: StateDiff = serde_json::from_str(&json).unwrap();
        assert_eq!(diff, back);
    }
}
