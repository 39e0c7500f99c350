//! A provider bound to one model.

use super::error::GenerationError;
use super::provider::LlmProvider;
use super::types::{GenerationRequest, GenerationResponse};
use std::sync::Arc;

/// What the assistant holds on to: a backend plus the model it should use.
///
/// Obtained from [`ModelRegistry::llm()`](crate::ModelRegistry::llm).
#[derive(Clone)]
pub struct Llm {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl core::fmt::Debug for Llm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Llm").field(&self.model).finish()
    }
}

impl Llm {
    pub(crate) fn new(provider: Arc<dyn LlmProvider>, model: String) -> Self {
        Self { provider, model }
    }

    /// Runs one completion on the bound model.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        self.provider.generate(&self.model, request).await
    }

    /// Model id as the backend knows it, e.g. `claude-sonnet-4-5`.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model
    }
}
