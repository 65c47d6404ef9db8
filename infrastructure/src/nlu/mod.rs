//! Pattern-matching NLU adapter.

pub mod complexity;
pub mod pattern_nlu;

pub use complexity::{analyze_complexity, UtteranceComplexity};
pub use pattern_nlu::{PatternNlu, PatternNluConfig};
