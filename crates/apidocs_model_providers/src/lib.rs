//! Language-model backends for apidocs.
//!
//! Each backend registers itself with a [`ModelRegistry`] under a provider
//! name, after which models are addressed as `"provider/model"`.
//!
//! | Provider | Feature Flag | Registry name |
//! |----------|--------------|---------------|
//! | Anthropic | `anthropic` (default) | `anthropic` |
//! | `OpenAI` | `openai` (default) | `openai` |
//!
//! ```no_run
//! use apidocs_model_providers::{ProviderKeys, register_providers};
//! use apidocs_models::ModelRegistry;
//!
//! let mut registry = ModelRegistry::new();
//! let keys = ProviderKeys {
//!     anthropic: std::env::var("ANTHROPIC_API_KEY").ok(),
//!     openai: std::env::var("OPENAI_API_KEY").ok(),
//! };
//! let registered = register_providers(&mut registry, &keys);
//! assert!(registered.len() <= 2);
//! ```

#[cfg(feature = "anthropic")]
mod http;

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicProvider;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;

use apidocs_models::ModelRegistry;
use std::sync::Arc;

/// API credentials per backend. A missing key leaves that backend unregistered.
#[derive(Clone, Default)]
pub struct ProviderKeys {
    /// Key for the Anthropic Messages API.
    pub anthropic: Option<String>,
    /// Key for the `OpenAI` Responses API.
    pub openai: Option<String>,
}

impl core::fmt::Debug for ProviderKeys {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProviderKeys")
            .field("anthropic", &self.anthropic.as_ref().map(|_| "[REDACTED]"))
            .field("openai", &self.openai.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Registers every compiled-in backend that has a non-empty key.
///
/// Returns the names that were registered.
pub fn register_providers(registry: &mut ModelRegistry, keys: &ProviderKeys) -> Vec<&'static str> {
    let mut registered = Vec::new();

    #[cfg(feature = "anthropic")]
    if let Some(key) = keys.anthropic.as_deref().filter(|key| !key.trim().is_empty()) {
        registry.register_llm_provider("anthropic", Arc::new(AnthropicProvider::new(key)));
        registered.push("anthropic");
    }

    #[cfg(feature = "openai")]
    if let Some(key) = keys.openai.as_deref().filter(|key| !key.trim().is_empty()) {
        registry.register_llm_provider("openai", Arc::new(OpenAiProvider::new(key)));
        registered.push("openai");
    }

    tracing::debug!(providers = ?registered, "registered model providers");
    registered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_keyed_providers_register() {
        let mut registry = ModelRegistry::new();
        let keys = ProviderKeys {
            anthropic: Some("sk-ant".into()),
            openai: Some("   ".into()),
        };

        let registered = register_providers(&mut registry, &keys);

        assert_eq!(registered, ["anthropic"]);
        assert!(registry.has_llm_provider("anthropic"));
        assert!(!registry.has_llm_provider("openai"));
    }

    #[test]
    fn keys_are_redacted_in_debug() {
        let keys = ProviderKeys {
            anthropic: Some("secret".into()),
            openai: None,
        };
        let rendered = format!("{keys:?}");
        assert!(!rendered.contains("secret"));
    }
}
