/// Error types surfaced by configuration, level loading and snapshots.
///
/// Simulation-time problems never show up here: the tick loop skips and
/// logs them instead of failing.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no level files configured; the game needs at least one level")]
    NoLevels,
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level not found: {name}")]
    NotFound { name: String },
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("level {name} has non-positive dimensions")]
    InvalidDimensions { name: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("no snapshot available")]
    NotFound,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Level(#[from] LevelError),
}
