//! Configuration for the supply network update.
//!
//! Loaded from `supply_config.json` with support for an environment variable override.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

pub const BUILTIN_SUPPLY_CONFIG: &str = include_str!("data/supply_config.json");

/// Root configuration for supply propagation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SupplyConfig {
    pub alliance: AllianceConfig,
    pub report: ReportConfig,
    pub anomalies: AnomalyConfig,
    pub snapshots: SnapshotConfig,
}

impl SupplyConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_SUPPLY_CONFIG)
                .expect("builtin supply config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, SupplyConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| SupplyConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = SupplyConfig::from_json_str(&contents)?;
        Ok(config)
    }
}

/// Bounds for the allied traversal sharing fixed point.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AllianceConfig {
    pub max_iterations: u32,
}

impl Default for AllianceConfig {
    fn default() -> Self {
        Self { max_iterations: 50 }
    }
}

/// Controls the diagnostic dump emitted after each update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub log_each_turn: bool,
    pub empire: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub warn_on_overlap: bool,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            warn_on_overlap: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub history_limit: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { history_limit: 64 }
    }
}

#[derive(Debug, Error)]
pub enum SupplyConfigError {
    #[error("failed to parse supply config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read supply config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle for accessing the supply configuration.
#[derive(Resource, Debug, Clone)]
pub struct SupplyConfigHandle(pub Arc<SupplyConfig>);

impl SupplyConfigHandle {
    pub fn new(config: Arc<SupplyConfig>) -> Self {
        Self(config)
    }

    pub fn get(&self) -> Arc<SupplyConfig> {
        Arc::clone(&self.0)
    }

    pub fn replace(&mut self, config: Arc<SupplyConfig>) {
        self.0 = config;
    }
}

/// Where the active supply configuration came from.
#[derive(Resource, Debug, Clone)]
pub struct SupplyConfigMetadata {
    path: Option<PathBuf>,
}

impl SupplyConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

/// Load supply configuration from `SUPPLY_CONFIG_PATH`, falling back to the builtin.
pub fn load_supply_config_from_env() -> (Arc<SupplyConfig>, SupplyConfigMetadata) {
    if let Some(path) = env::var("SUPPLY_CONFIG_PATH").ok().map(PathBuf::from) {
        match SupplyConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "starlane::config",
                    path = %path.display(),
                    "supply_config.loaded=file"
                );
                return (Arc::new(config), SupplyConfigMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "starlane::config",
                    path = %path.display(),
                    error = %err,
                    "supply_config.load_failed"
                );
            }
        }
    }

    let config = SupplyConfig::builtin();
    tracing::info!(target: "starlane::config", "supply_config.loaded=builtin");
    (config, SupplyConfigMetadata::new(None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_parses() {
        let config = SupplyConfig::builtin();
        assert_eq!(config.alliance.max_iterations, 50);
        assert!(!config.report.log_each_turn);
        assert!(config.anomalies.warn_on_overlap);
    }

    #[test]
    fn missing_sections_take_defaults() {
        let config = SupplyConfig::from_json_str(r#"{"report": {"empire": 3}}"#).unwrap();
        assert_eq!(config.report.empire, Some(3));
        assert_eq!(config.alliance.max_iterations, 50);
        assert_eq!(config.snapshots.history_limit, 64);
    }

    #[test]
    fn unreadable_file_reports_path() {
        let err = SupplyConfig::from_file(Path::new("/nonexistent/supply.json")).unwrap_err();
        assert!(matches!(err, SupplyConfigError::Read { .. }));
        assert!(err.to_string().contains("supply.json"));
    }

    #[test]
    fn handle_replace_swaps_active_config() {
        let mut handle = SupplyConfigHandle::new(SupplyConfig::builtin());
        let before = handle.get();
        let tuned =
            SupplyConfig::from_json_str(r#"{"alliance": {"max_iterations": 5}}"#).unwrap();
        handle.replace(Arc::new(tuned));
        assert_eq!(handle.get().alliance.max_iterations, 5);
        assert_eq!(before.alliance.max_iterations, 50);
    }
}
