//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and playback so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: cropsim_core::ConfigError,
    },

    /// The scenario file could not be read.
    #[error("failed to read scenario file {path}: {source}")]
    ScenarioIo {
        /// Path that was read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The scenario document was rejected.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying validation error.
        #[from]
        source: cropsim_core::ScenarioError,
    },

    /// Building the scene failed.
    #[error("construction error: {source}")]
    Construction {
        /// The underlying construction error.
        #[from]
        source: cropsim_core::ConstructionError,
    },

    /// The timeline could not be played.
    #[error("controller error: {source}")]
    Controller {
        /// The underlying controller error.
        #[from]
        source: cropsim_core::ControllerError,
    },

    /// The HTTP client could not be created.
    #[error("HTTP client error: {message}")]
    Http {
        /// Description of the failure.
        message: String,
    },
}
