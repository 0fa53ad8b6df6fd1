//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the tick loop
//! so `main` can propagate with `?`.

use delve_types::ErrorCategory;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: delve_core::ConfigError,
    },

    /// Terrain generation produced an unusable grid.
    #[error("terrain error: {source}")]
    Terrain {
        /// The underlying terrain error.
        #[from]
        source: delve_world::WorldError,
    },

    /// The world driver failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: delve_core::CoreError,
    },

    /// The final snapshot could not be serialized.
    #[error("snapshot serialization failed: {source}")]
    Snapshot {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

impl EngineError {
    /// The taxonomy category of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { source } => source.category(),
            Self::Terrain { source } => source.category(),
            Self::World { source } => source.category(),
            Self::Snapshot { .. } => ErrorCategory::InvalidState,
        }
    }
}
