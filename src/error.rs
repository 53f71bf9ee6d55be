//! Error types for the render pipeline

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Stage;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing a map image.
///
/// Every variant except `ConfigError` belongs to exactly one pipeline stage;
/// see [`Error::stage`].
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration, detected before any stage runs
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Failed to read, fetch or parse the stylesheet (or one of its datasources)
    #[error("Failed to load stylesheet {source_name}: {reason}")]
    LoadError { source_name: String, reason: String },

    /// Failed to rasterize the map
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to encode the image buffer
    #[error("PNG encoding failed: {0}")]
    EncodeError(String),

    /// Failed to write the encoded image to disk
    #[error("Failed to write {}: {source}", .path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn load(source_name: impl ToString, reason: impl ToString) -> Self {
        Error::LoadError {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// The pipeline stage that raised this error, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::ConfigError(_) => None,
            Error::LoadError { .. } => Some(Stage::LoadStyle),
            Error::RenderError(_) => Some(Stage::Render),
            Error::EncodeError(_) => Some(Stage::Encode),
            Error::WriteError { .. } => Some(Stage::WriteFile),
        }
    }
}
