//! Configuration file loading.

pub mod file_config;
pub mod loader;

pub use file_config::{EngineSection, FileConfig, NlgSection, NluSection};
pub use loader::ConfigLoader;
