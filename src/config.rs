use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable overriding [`PatternDbConfig::directory`].
pub const PDB_DIR_ENV: &str = "NPUZZLE_PDB_DIR";

pub const LOWER_PDB_FILE: &str = "pdb1.bin";
pub const UPPER_PDB_FILE: &str = "pdb2.bin";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget for a single search, in seconds.
    pub time_limit_secs: u64,
    pub pattern_databases: PatternDbConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PatternDbConfig {
    pub enabled: bool,
    pub directory: PathBuf,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: 300,
            pattern_databases: PatternDbConfig::default(),
        }
    }
}

impl Default for PatternDbConfig {
    fn default() -> Self {
        let directory = std::env::var_os(PDB_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("pdb"));
        Self {
            enabled: true,
            directory,
        }
    }
}

impl SolverConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }
}

impl PatternDbConfig {
    pub fn lower_path(&self) -> PathBuf {
        self.directory.join(LOWER_PDB_FILE)
    }

    pub fn upper_path(&self) -> PathBuf {
        self.directory.join(UPPER_PDB_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_five_minutes() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit(), Duration::from_secs(300));
        assert!(config.pattern_databases.enabled);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            SolverConfig::from_json(r#"{ "pattern_databases": { "enabled": false } }"#).unwrap();
        assert_eq!(config.time_limit_secs, 300);
        assert!(!config.pattern_databases.enabled);

        let config = SolverConfig::from_json(r#"{ "time_limit_secs": 2 }"#).unwrap();
        assert_eq!(config.time_limit(), Duration::from_secs(2));
        assert!(config.pattern_databases.enabled);
    }

    #[test]
    fn database_paths_join_directory() {
        let config = PatternDbConfig {
            enabled: true,
            directory: PathBuf::from("/data/pdb"),
        };
        assert_eq!(config.lower_path(), PathBuf::from("/data/pdb/pdb1.bin"));
        assert_eq!(config.upper_path(), PathBuf::from("/data/pdb/pdb2.bin"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SolverConfig::load(Path::new("/nonexistent/npuzzle.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
