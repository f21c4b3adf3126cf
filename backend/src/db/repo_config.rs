//! Configuration file support.
//!
//! `repository.toml` selects the storage backend and tunes recalculation:
//!
//! ```toml
//! [repository]
//! type = "local"
//!
//! [recalculation]
//! grace_days = 2
//! default_distribution = "frontload"
//! respect_locks = true
//! max_dependency_passes = 100
//! ```

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::factory::RepositoryType;
use super::repository::RepositoryError;
use crate::models::Distribution;
use crate::scheduler::{DEFAULT_GRACE_DAYS, DEFAULT_MAX_DEPENDENCY_PASSES};

/// Configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub recalculation: RecalculationSettings,
}

/// Repository type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: "local".to_string(),
        }
    }
}

/// Defaults applied to every recalculation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationSettings {
    /// Days after today used for dates that would fall in the past
    #[serde(default = "default_grace_days")]
    pub grace_days: u32,
    #[serde(default)]
    pub default_distribution: Distribution,
    #[serde(default = "default_respect_locks")]
    pub respect_locks: bool,
    #[serde(default = "default_max_dependency_passes")]
    pub max_dependency_passes: usize,
}

fn default_grace_days() -> u32 {
    DEFAULT_GRACE_DAYS
}

fn default_respect_locks() -> bool {
    true
}

fn default_max_dependency_passes() -> usize {
    DEFAULT_MAX_DEPENDENCY_PASSES
}

impl Default for RecalculationSettings {
    fn default() -> Self {
        Self {
            grace_days: default_grace_days(),
            default_distribution: Distribution::default(),
            respect_locks: default_respect_locks(),
            max_dependency_passes: default_max_dependency_passes(),
        }
    }
}

impl RecalculationSettings {
    /// Defaults overridden by `RECALC_GRACE_DAYS` and `RECALC_DEFAULT_DISTRIBUTION`.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides. Unparseable values are logged and ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("RECALC_GRACE_DAYS") {
            match val.trim().parse() {
                Ok(days) => self.grace_days = days,
                Err(_) => warn!("Ignoring invalid RECALC_GRACE_DAYS='{}'", val),
            }
        }
        if let Ok(val) = std::env::var("RECALC_DEFAULT_DISTRIBUTION") {
            match val.parse() {
                Ok(distribution) => self.default_distribution = distribution,
                Err(e) => warn!("Ignoring RECALC_DEFAULT_DISTRIBUTION: {}", e),
            }
        }
        self
    }

    /// Replace out-of-range values with their defaults.
    pub fn validated(mut self) -> Self {
        if self.max_dependency_passes == 0 {
            warn!(
                "Ignoring max_dependency_passes = 0; using {}",
                DEFAULT_MAX_DEPENDENCY_PASSES
            );
            self.max_dependency_passes = DEFAULT_MAX_DEPENDENCY_PASSES;
        }
        self
    }
}

impl RepositoryConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ConfigurationError)` if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!("Failed to read config file: {}", e))
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.recalculation = config.recalculation.validated();
        Ok(config)
    }

    /// Locate `repository.toml` relative to `dir`.
    ///
    /// Searches, in order:
    /// 1. `dir` itself
    /// 2. `dir/backend/`
    /// 3. The parent of `dir`
    pub fn locate_in<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
        let dir = dir.as_ref();
        [
            dir.join("repository.toml"),
            dir.join("backend").join("repository.toml"),
            dir.join("..").join("repository.toml"),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Load configuration from the default location under the working directory.
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        match Self::locate_in(".") {
            Some(path) => Self::from_file(path),
            None => Err(RepositoryError::configuration(
                "No repository.toml found in standard locations",
            )),
        }
    }

    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }
}
