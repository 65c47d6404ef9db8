//! Labeled state snapshots.

use ibis_domain::InformationState;
use serde::{Deserialize, Serialize};

/// A labeled copy of the information state at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: InformationState,
    pub timestamp: u64,
    pub label: String,
}

impl StateSnapshot {
    pub fn from_state(state: &InformationState, timestamp: u64, label: impl Into<String>) -> Self {
        Self {
            state: state.clone(),
            timestamp,
            label: label.into(),
        }
    }
}
