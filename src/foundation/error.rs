/// Convenience result type used across Sparkreel.
pub type SparkreelResult<T> = Result<T, SparkreelError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum SparkreelError {
    /// Invalid user-provided settings or frame data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while fetching or decoding texture assets. Retriable: the
    /// cache clears its in-flight marker so a later load may succeed.
    #[error("texture error: {0}")]
    Texture(String),

    /// Errors raised by a frame renderer while painting a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while encoding frames or finalizing the output container.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SparkreelError {
    /// Build a [`SparkreelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SparkreelError::Texture`] value.
    pub fn texture(msg: impl Into<String>) -> Self {
        Self::Texture(msg.into())
    }

    /// Build a [`SparkreelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`SparkreelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}
