//! Presentation layer for ibis-dialogue
//!
//! Renderer-agnostic value types for visualizing dialogue state: labeled
//! snapshots, field-level diffs between snapshots, and per-phase rule
//! traces. Actual renderers (terminal, HTML, ...) are external
//! collaborators that consume these values.

pub mod diff;
pub mod snapshot;
pub mod trace;

// Re-export commonly used types
pub use diff::{ChangeType, ChangedField, StateDiff};
pub use snapshot::StateSnapshot;
pub use trace::RuleTrace;
