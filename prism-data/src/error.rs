use thiserror::Error;

/// Errors from reading or writing frame data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PLY error: {0}")]
    Ply(#[from] serde_ply::SerializeError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Color and depth resolution differ: {color:?} vs {depth:?}")]
    ResolutionMismatch { color: (u32, u32), depth: (u32, u32) },
}
