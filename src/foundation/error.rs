/// Convenience result type used across pixelart.
pub type PixelartResult<T> = Result<T, PixelartError>;

/// Top-level error taxonomy crossing the crate boundary.
///
/// The variants are deliberately coarse so that a host (HTTP layer, CLI) can map each one to a
/// distinct response through [`PixelartError::kind`].
#[derive(thiserror::Error, Debug)]
pub enum PixelartError {
    /// Source could not be read as the format it claims to be.
    #[error("decode error: {0}")]
    Decode(String),

    /// Unsupported media category or invalid parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Any failure on the multi-process video path, wrapping the underlying cause.
    #[error("video processing error: {0}")]
    VideoProcessing(#[source] Box<PixelartError>),

    /// Output could not be encoded or written.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Discriminant of [`PixelartError`] without the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`PixelartError::Decode`].
    Decode,
    /// See [`PixelartError::Validation`].
    Validation,
    /// See [`PixelartError::VideoProcessing`].
    VideoProcessing,
    /// See [`PixelartError::Encode`].
    Encode,
    /// See [`PixelartError::Other`].
    Other,
}

impl PixelartError {
    /// Build a [`PixelartError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`PixelartError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PixelartError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Wrap `cause` as a [`PixelartError::VideoProcessing`].
    ///
    /// Already-wrapped errors are returned as-is so the video path surfaces exactly one layer.
    pub fn video(cause: impl Into<PixelartError>) -> Self {
        match cause.into() {
            err @ Self::VideoProcessing(_) => err,
            err => Self::VideoProcessing(Box::new(err)),
        }
    }

    /// Shorthand for a [`PixelartError::VideoProcessing`] carrying a plain message.
    pub fn video_msg(msg: impl Into<String>) -> Self {
        Self::video(anyhow::anyhow!(msg.into()))
    }

    /// Coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Validation(_) => ErrorKind::Validation,
            Self::VideoProcessing(_) => ErrorKind::VideoProcessing,
            Self::Encode(_) => ErrorKind::Encode,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
