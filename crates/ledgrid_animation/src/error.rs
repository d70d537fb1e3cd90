//! Animation error types

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building animations or the controller
#[derive(Error, Debug)]
pub enum AnimationError {
    /// A group needs at least one task
    #[error("Group needs at least one task")]
    EmptyGroup,

    /// A sequence needs at least one task
    #[error("Sequence needs at least one task")]
    EmptySequence,

    /// A polygon path needs at least one point
    #[error("Polygon path needs at least one point")]
    EmptyPath,

    /// A palette source needs at least one palette
    #[error("Palette source needs at least one palette")]
    EmptyPalette,

    /// A controller thread could not be spawned
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid controller configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Controller configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for a controller config
    #[error("Invalid controller config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Refresh period must be at least one millisecond
    #[error("Refresh rate must be greater than zero")]
    ZeroRefreshRate,

    /// Worker pool needs at least one thread
    #[error("Worker count must be greater than zero")]
    ZeroWorkers,
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
