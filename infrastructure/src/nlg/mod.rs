//! Template NLG adapter.

pub mod template_nlg;

pub use template_nlg::{TemplateNlg, TemplateNlgConfig};
