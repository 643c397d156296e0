//! Error types for the application.

use thiserror::Error;

/// Errors that can occur while setting up or running the pipeline.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error in {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Capture error: {0}")]
    Capture(#[from] prism_capture::CaptureError),

    #[error("Producer thread panicked")]
    ProducerPanicked,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
