/// Convenience result type used across ogcard.
pub type OgResult<T> = Result<T, OgError>;

/// Top-level error taxonomy used by library APIs.
///
/// Input anomalies never reach this type: the content normalizer defaults them away. Avatar
/// failures are folded into [`ResolvedAvatar::Absent`](crate::ResolvedAvatar::Absent) before
/// they leave the resolver, so in practice only render failures propagate to callers.
#[derive(thiserror::Error, Debug)]
pub enum OgError {
    /// Invalid configuration or malformed layout data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Remote avatar could not be fetched or decoded.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The rasterization engine rejected the tree or failed internally.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OgError {
    /// Build an [`OgError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build an [`OgError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build an [`OgError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build an [`OgError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
