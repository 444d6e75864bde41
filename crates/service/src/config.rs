//! Service configuration
//!
//! Loaded from TOML. Every field has a default, so a missing file or an
//! empty table still yields a runnable config.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tessera_core::ReservationConfig;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub database: DatabaseConfig,
    pub holds: HoldConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path; defaults to the platform data directory
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldConfig {
    /// Minutes a reservation hold lasts before the sweep may reclaim it
    pub ttl_minutes: i64,
    /// Seconds between hold-expiry sweeps
    pub sweep_interval_seconds: u64,
}

impl Default for HoldConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 10,
            sweep_interval_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Seed file applied on first run against an empty database
    pub file: Option<PathBuf>,
}

impl ServiceConfig {
    /// Load configuration
    ///
    /// An explicitly given path must exist. The default location may be
    /// absent, in which case defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                info!(path = %path.display(), "Loading config");
                let content = std::fs::read_to_string(path)?;
                Self::from_toml(&content)
            }
            None => {
                let default_path = Self::config_path()?;
                if default_path.exists() {
                    info!(path = %default_path.display(), "Loading config");
                    let content = std::fs::read_to_string(&default_path)?;
                    Self::from_toml(&content)
                } else {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("io", "tessera", "tessera").ok_or(Error::NoDataDir)
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Database file location
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("tessera.db")),
        }
    }

    /// Reservation policy derived from the hold settings
    pub fn reservation_config(&self) -> ReservationConfig {
        ReservationConfig {
            hold_ttl: chrono::Duration::minutes(self.holds.ttl_minutes),
        }
    }

    /// How often the sweeper runs
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.holds.sweep_interval_seconds)
    }
}
