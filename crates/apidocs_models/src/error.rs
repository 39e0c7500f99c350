//! Error types for the model registry.

/// Error creating a model handle.
#[derive(Debug, thiserror::Error)]
pub enum CreateModelError {
    /// Model id is not of the form `provider/model`.
    #[error("invalid model id '{0}': expected format 'provider/model'")]
    InvalidModelId(String),

    /// No provider is registered under this name.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}
