//! Service error types

use std::io;

/// Service result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while wiring and running the service
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Seed error: {0}")]
    Seed(String),

    #[error("Inventory error: {0}")]
    Core(#[from] tessera_core::Error),
}
