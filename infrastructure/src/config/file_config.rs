//! Typed configuration file schema.
//!
//! Every section and field has a serde default, so a missing or partial
//! `ibis.toml` still yields a working kernel.

use serde::{Deserialize, Serialize};

fn default_agent_id() -> String {
    "system".to_string()
}

fn default_last_moves_limit() -> usize {
    10
}

/// `[engine]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Agent id used for fresh information states.
    pub agent_id: String,
    /// Bound on the shared recency buffer.
    pub last_moves_limit: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            agent_id: default_agent_id(),
            last_moves_limit: default_last_moves_limit(),
        }
    }
}

/// `[nlu]` section (pattern NLU adapter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NluSection {
    pub enable_fast_path: bool,
    pub min_confidence: f64,
    pub fast_path_confidence: f64,
}

impl Default for NluSection {
    fn default() -> Self {
        Self {
            enable_fast_path: true,
            min_confidence: 0.3,
            fast_path_confidence: 0.95,
        }
    }
}

/// `[nlg]` section (template NLG adapter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NlgSection {
    pub use_plan_awareness: bool,
    pub use_domain_descriptions: bool,
}

impl Default for NlgSection {
    fn default() -> Self {
        Self {
            use_plan_awareness: true,
            use_domain_descriptions: true,
        }
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub engine: EngineSection,
    pub nlu: NluSection,
    pub nlg: NlgSection,
}

impl FileConfig {
    /// Adapter config for the pattern NLU engine.
    pub fn pattern_nlu_config(&self) -> crate::nlu::PatternNluConfig {
        crate::nlu::PatternNluConfig {
            enable_fast_path: self.nlu.enable_fast_path,
            min_confidence: self.nlu.min_confidence,
            fast_path_confidence: self.nlu.fast_path_confidence,
        }
    }

    /// Adapter config for the template NLG engine.
    pub fn template_nlg_config(&self) -> crate::nlg::TemplateNlgConfig {
        crate::nlg::TemplateNlgConfig {
            use_plan_awareness: self.nlg.use_plan_awareness,
            use_domain_descriptions: self.nlg.use_domain_descriptions,
        }
    }
}
