//! Infrastructure layer for ibis-dialogue
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: a pattern-matching NLU engine, a template NLG engine,
//! configuration file loading, and logging sinks.

pub mod config;
pub mod logging;
pub mod nlg;
pub mod nlu;

// Re-export commonly used types
pub use config::{ConfigLoader, EngineSection, FileConfig, NlgSection, NluSection};
pub use logging::{init_tracing, JsonlEventLog};
pub use nlg::{TemplateNlg, TemplateNlgConfig};
pub use nlu::{analyze_complexity, PatternNlu, PatternNluConfig, UtteranceComplexity};
