//! Configuration loader with multi-source merging.

use super::file_config::FileConfig;
use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

/// Loads and merges configuration sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with proper priority (highest to lowest):
    ///
    /// 1. Explicit config path (if provided)
    /// 2. Project root: `./ibis.toml` or `./.ibis.toml`
    /// 3. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(project_path) = Self::project_config_path() {
            figment = figment.merge(Toml::file(&project_path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.extract().map_err(Box::new)
    }

    /// Defaults only (for hosts that opt out of config files).
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// The project-level config file, if one exists.
    pub fn project_config_path() -> Option<PathBuf> {
        ["ibis.toml", ".ibis.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}
