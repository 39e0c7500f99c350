//! # apidocs
//!
//! API documentation search and question answering. Re-exports the member
//! crates for convenience.

/// Layer 0: tracing, clock and settings.
pub use apidocs_core;

/// Layer 1: language-model interface and registry.
pub use apidocs_models;

/// Layer 1: Anthropic and `OpenAI` backends.
pub use apidocs_model_providers;

/// Layer 1: schema-validated tool framework.
pub use apidocs_tools;

/// Layer 2: spec normalization, ranked retrieval, ingestion and the runtime spec cache.
pub use apidocs_catalog;

/// Layer 3: query classification, sessions and tool orchestration.
pub use apidocs_agent;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use apidocs_agent::{AgentConfig, Assistant, QueryContext, QueryRequest, QueryResponse};
    pub use apidocs_catalog::{
        CatalogError, CatalogStore, DocSearch, DocsService, DynamicSpecCache, HttpMethod,
        HttpSpecFetcher, Ingestor, MemoryCatalog, SpecSearch, default_providers,
    };
    pub use apidocs_core::{Settings, TracingSetup};
    pub use apidocs_models::ModelRegistry;
}
