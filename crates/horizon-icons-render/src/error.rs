//! Error types for the render crate.

use thiserror::Error;

/// Errors that can occur while decoding, fitting or caching icon images.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The stream content is corrupt or could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// Encoding an image to bytes failed.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// The stream content is not a recognized image format.
    #[error("unrecognized image format")]
    UnsupportedFormat,

    /// Reading the backing stream failed.
    #[error("failed to read image stream: {0}")]
    Io(#[from] std::io::Error),

    /// Nearest-fit was requested with no candidate frames.
    #[error("no candidate frames available for size {size}")]
    EmptyCandidateSet { size: u32 },

    /// A cache key was malformed (for example a zero size on insert).
    #[error("invalid cache key: {0}")]
    InvalidKey(String),
}

impl RenderError {
    /// Whether this error belongs to the decode class (content or stream failure).
    ///
    /// Callers treat these as "no frames available" rather than aborting.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::UnsupportedFormat | Self::Io(_))
    }
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(_) => RenderError::UnsupportedFormat,
            image::ImageError::IoError(e) => RenderError::Io(e),
            other => RenderError::Decode(other.to_string()),
        }
    }
}

impl From<tiff::TiffError> for RenderError {
    fn from(err: tiff::TiffError) -> Self {
        match err {
            tiff::TiffError::IoError(e) => RenderError::Io(e),
            other => RenderError::Decode(format!("TIFF: {}", other)),
        }
    }
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
