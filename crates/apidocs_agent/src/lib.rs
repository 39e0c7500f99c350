//! Question answering over API documentation.
//!
//! A query flows through three stages:
//!
//! 1. [`QueryClassifier`] picks an intent, the preferred tools and a
//!    provider hint from a declarative keyword table.
//! 2. [`ToolOrchestrator`] lets the model call the documentation tools in
//!    bounded rounds until it answers.
//! 3. [`Assistant`] ties both to a [`SessionStore`] so follow-up questions see
//!    earlier turns, and substitutes a labeled search-based answer when the
//!    model is missing or failing.
//!
//! # Example
//!
//! ```no_run
//! use apidocs_agent::{Assistant, QueryRequest};
//! use apidocs_catalog::{DocsService, DynamicSpecCache, HttpSpecFetcher, MemoryCatalog};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), apidocs_agent::AgentError> {
//! let service = DocsService::new(
//!     Arc::new(MemoryCatalog::new()),
//!     Arc::new(DynamicSpecCache::new(Arc::new(HttpSpecFetcher::default()))),
//! );
//! let assistant = Assistant::builder(service).build().await?;
//!
//! let answer = assistant.ask(QueryRequest::new("how do I create a jira issue")).await;
//! assert!(answer.fallback);
//! # Ok(())
//! # }
//! ```

mod assistant;
mod classifier;
mod config;
mod orchestrator;
mod prompt;
mod session;
mod tools;

pub use assistant::{
    AgentError, Assistant, AssistantBuilder, AssistantStatus, IntentSummary, QueryContext,
    QueryRequest, QueryResponse,
};
pub use classifier::{
    Classification, IntentType, PROVIDER_ALIASES, QueryClassifier, QueryComplexity,
    SessionFactors,
};
pub use config::AgentConfig;
pub use orchestrator::{
    Conversation, OrchestrationState, OrchestratorConfig, Outcome, OutcomeKind, ToolOrchestrator,
    UNABLE_TO_COMPLETE,
};
pub use prompt::{PromptContext, system_prompt};
pub use session::{
    Session, SessionConfig, SessionError, SessionGuard, SessionStats, SessionStore, Turn,
};
pub use tools::{DocTool, DocumentationTool, documentation_tools};
