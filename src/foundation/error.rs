/// Result alias used throughout the crate.
pub type BlurResult<T> = Result<T, BlurError>;

/// Errors surfaced by strength map generation, configuration and the blur pipeline.
///
/// Most out-of-range inputs are clamped rather than rejected; these variants cover the hard
/// preconditions (malformed specs, invalid configuration) and raster bookkeeping failures.
#[derive(thiserror::Error, Debug)]
pub enum BlurError {
    /// Invalid caller input (malformed gradient spec, bad configuration value).
    #[error("validation error: {0}")]
    Validation(String),

    /// A pass or capture could not produce its raster.
    #[error("render error: {0}")]
    Render(String),

    /// Configuration (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, usually from a host-provided frame source.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlurError {
    /// Build a [`BlurError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BlurError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`BlurError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
