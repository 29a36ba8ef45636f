use thiserror::Error;

/// I/O errors that can occur when talking to object storage
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Errors raised by the image codec while transforming a source object
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// Source bytes could not be decoded
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Transformed image could not be encoded
    #[error("Failed to encode image as {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    /// Source bytes are not in a format the codec recognises
    #[error("Unrecognised source image format")]
    UnknownFormat,

    /// The blocking codec task panicked or was cancelled
    #[error("Transform task failed: {message}")]
    Task { message: String },
}

/// Request rejections. These are the only errors turned into a
/// structured (403) response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Caller header does not carry the trusted token
    #[error("Forbidden")]
    Forbidden,

    /// Width is not an integer from the allow-list
    #[error("Not authorized, invalid width, given: {given}")]
    InvalidWidth { given: String },

    /// Resolved format is not in the allow-list
    #[error("Not authorized, invalid format, given: {given}")]
    InvalidFormat { given: String },

    /// No image key was supplied
    #[error("Not authorized, missing image key")]
    MissingImage,
}

/// Upstream failures that abort a resize request.
///
/// These are never recovered or retried; the HTTP layer reports them as an
/// opaque server error.
#[derive(Debug, Clone, Error)]
pub enum ResizeError {
    /// Fetching the source or storing the derived object failed
    #[error("Storage error: {0}")]
    Io(#[from] IoError),

    /// Decoding, resizing or encoding failed
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),
}
