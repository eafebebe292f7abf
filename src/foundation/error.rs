/// Convenience result type used across the pipeline.
pub type DashResult<T> = Result<T, DashError>;

/// Top-level error taxonomy used by pipeline stages and their collaborators.
#[derive(thiserror::Error, Debug)]
pub enum DashError {
    /// Invalid configuration or input data that cannot be substituted with a default.
    #[error("validation error: {0}")]
    Validation(String),

    /// The external page renderer failed or produced unusable output.
    #[error("capture error: {0}")]
    Capture(String),

    /// Decoding, encoding or drawing an image failed.
    #[error("image error: {0}")]
    Image(String),

    /// The configuration document could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DashError {
    /// Build a [`DashError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DashError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`DashError::Image`] value.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::Image(msg.into())
    }

    /// Build a [`DashError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
