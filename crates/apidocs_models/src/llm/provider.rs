//! Backend seam for chat-completion services.

use super::error::GenerationError;
use super::types::{GenerationRequest, GenerationResponse};
use async_trait::async_trait;

/// A chat-completion backend that can serve any of its models.
///
/// Implementations translate [`GenerationRequest`] into their wire format and
/// map transport or status failures onto [`GenerationError`] so callers can
/// decide whether to retry.
#[async_trait]
pub trait LlmProvider: Send + Sync + 'static {
    /// Runs one completion against `model`.
    async fn generate(
        &self,
        model: &str,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError>;
}
