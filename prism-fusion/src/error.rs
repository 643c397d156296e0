use thiserror::Error;

/// Errors raised by detectors.
#[derive(Debug, Error)]
pub enum FusionError {
    #[error("Detector received an empty image")]
    EmptyImage,

    #[error("Detector failed: {0}")]
    DetectorFailed(String),

    #[error("Detector is not initialized")]
    NotInitialized,
}
