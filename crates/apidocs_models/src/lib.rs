//! Language-model service interface and registry for apidocs.
//!
//! Consumers depend on this crate only. Concrete backends live in
//! `apidocs_model_providers` and register themselves into a [`ModelRegistry`]
//! under a provider name, after which models are addressed as
//! `"provider/model"`.
//!
//! # Example
//!
//! ```ignore
//! use apidocs_models::ModelRegistry;
//! use apidocs_models::llm::GenerationRequest;
//!
//! let llm = registry.llm("openai/gpt-4o-mini")?;
//! let request = GenerationRequest::with_system("You answer API questions", "List Jira issue endpoints");
//! let response = llm.generate(request).await?;
//! println!("{}", response.text());
//! ```

pub mod error;
pub mod llm;
mod registry;

pub use registry::ModelRegistry;
