//! Domain action execution.
//!
//! Actions themselves run outside the kernel (booking APIs, document
//! generators, devices); this controller does the state-side bookkeeping
//! around them: precondition checking against the commitment store,
//! postcondition effects into commitments, exec-subplan completion, and an
//! [`ActionRecord`] either way. A failed precondition is surfaced in the
//! record's status, never as an error.

use ibis_domain::{Action, ActionRecord, DomainModel, InformationState};
use std::sync::Arc;
use tracing::{debug, warn};

/// State-side executor for domain actions.
pub struct ExecutionController {
    domain: Arc<DomainModel>,
}

impl ExecutionController {
    pub fn new(domain: Arc<DomainModel>) -> Self {
        Self { domain }
    }

    /// Check, apply, and record one action. Pure with respect to the
    /// caller's state.
    ///
    /// On success the action's postcondition propositions are committed in
    /// canonical form and any matching active `exec` subplan is completed.
    /// On a failed precondition the state gains only the failure record.
    pub fn execute(
        &self,
        action: &Action,
        state: &InformationState,
    ) -> (InformationState, ActionRecord) {
        let mut new_state = state.clone();

        let (ok, reason) = self
            .domain
            .check_preconditions(action, &new_state.shared.commitments);
        if !ok {
            warn!(action = %action.name, %reason, "action preconditions not met");
            let record = ActionRecord::failed(action.name.clone(), reason);
            new_state.shared.actions.push(record.clone());
            return (new_state, record);
        }

        let effects = self.domain.postcond(action);
        for effect in &effects {
            new_state.shared.commit(effect.to_string());
        }
        for plan in &mut new_state.private.plan {
            if plan.complete_exec_for(&action.name) {
                break;
            }
        }
        debug!(action = %action.name, effects = effects.len(), "executed action");

        let record = ActionRecord::succeeded(action.name.clone(), effects);
        new_state.shared.actions.push(record.clone());
        (new_state, record)
    }
}
