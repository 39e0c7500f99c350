//! Name-to-backend lookup for `provider/model` identifiers.

use crate::error::CreateModelError;
use crate::llm::{Llm, LlmProvider};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Backends available to the process, keyed by provider name.
///
/// The binary registers whichever backends have credentials, then resolves the
/// configured `APIDOCS_LLM` setting with [`llm()`](Self::llm).
///
/// ```
/// # use apidocs_models::ModelRegistry;
/// # use apidocs_models::llm::{LlmProvider, GenerationRequest, GenerationResponse, GenerationError};
/// # use async_trait::async_trait;
/// # use std::sync::Arc;
/// # struct Echo;
/// # #[async_trait]
/// # impl LlmProvider for Echo {
/// #   async fn generate(&self, _model: &str, _request: GenerationRequest) -> Result<GenerationResponse, GenerationError> {
/// #     unimplemented!()
/// #   }
/// # }
/// let mut registry = ModelRegistry::new();
/// registry.register_llm_provider("echo", Arc::new(Echo));
///
/// let llm = registry.llm("echo/v1").unwrap();
/// assert_eq!(llm.model_name(), "v1");
/// ```
#[derive(Default)]
pub struct ModelRegistry {
    backends: BTreeMap<String, Arc<dyn LlmProvider>>,
}

impl core::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.backends.keys()).finish()
    }
}

impl ModelRegistry {
    /// No backends.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `model_id` (`provider/model`) to its backend.
    ///
    /// # Errors
    ///
    /// [`CreateModelError::InvalidModelId`] when either half is missing,
    /// [`CreateModelError::UnknownProvider`] when nothing is registered under
    /// the provider half.
    pub fn llm(&self, model_id: impl AsRef<str>) -> Result<Llm, CreateModelError> {
        let model_id = model_id.as_ref();
        let Some((provider, model)) = model_id
            .split_once('/')
            .filter(|(provider, model)| !provider.is_empty() && !model.is_empty())
        else {
            return Err(CreateModelError::InvalidModelId(model_id.to_owned()));
        };

        let backend = self
            .backends
            .get(provider)
            .ok_or_else(|| CreateModelError::UnknownProvider(provider.to_owned()))?;
        Ok(Llm::new(Arc::clone(backend), model.to_owned()))
    }

    /// Adds a backend under `name`.
    ///
    /// # Panics
    ///
    /// When `name` is taken; registration happens once at startup.
    pub fn register_llm_provider<P: LlmProvider>(
        &mut self,
        name: impl Into<String>,
        provider: Arc<P>,
    ) {
        let name = name.into();
        assert!(
            !self.backends.contains_key(&name),
            "LLM provider '{name}' is already registered"
        );
        self.backends.insert(name, provider);
    }

    /// Whether a backend is registered under `name`.
    #[must_use]
    pub fn has_llm_provider(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// Registered provider names in sorted order.
    #[must_use]
    pub fn llm_provider_names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }
}
