//! The core [`Tool`] trait for executable tools.

use crate::error::ToolError;
use apidocs_models::llm::ToolDefinition;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`Tool::execute`].
pub type ToolFuture<'a> =
    Pin<Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send + 'a>>;

/// A tool that can be invoked by the language model.
///
/// Tools expose a [`ToolDefinition`] (name, description, JSON schema) for the
/// model, and an async [`execute`](Tool::execute) that receives arguments
/// already checked against that schema by the
/// [`ToolRegistry`](crate::ToolRegistry).
pub trait Tool: Send + Sync + 'static {
    /// Returns the model-facing tool definition with JSON schema.
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with JSON arguments.
    fn execute(&self, args: serde_json::Value) -> ToolFuture<'_>;
}
