use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeshError>;

/// Failures while turning an image into a model
///
/// Callers surface both variants the same way; the split only helps logs.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Encoding failure: {0}")]
    Encoding(String),
}

impl From<image::ImageError> for MeshError {
    fn from(e: image::ImageError) -> Self {
        MeshError::InvalidImage(e.to_string())
    }
}
