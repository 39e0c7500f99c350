//! Tool registry.
//!
//! The [`ToolRegistry`] owns registered tools in registration order. Every
//! definition is checked once when registered (unique, well-formed name and an
//! object input schema) and kept alongside the tool; calls are validated
//! against that stored schema before the tool body runs.

use crate::error::{RegistrationError, ToolError};
use crate::tool::{Tool, ToolFuture};
use crate::validate::validate_arguments;
use apidocs_models::llm::ToolDefinition;
use indexmap::IndexMap;
use std::sync::Arc;

struct Entry {
    tool: Arc<dyn Tool>,
    definition: ToolDefinition,
}

/// Registry of available tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Entry>,
}

impl core::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
        }
    }

    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// Rejects duplicate names, malformed names and non-object input schemas.
    pub fn try_register(&mut self, tool: impl Tool) -> Result<(), RegistrationError> {
        let definition = tool.definition();
        check_definition(&definition)?;
        if self.tools.contains_key(&definition.name) {
            return Err(RegistrationError::Duplicate(definition.name));
        }
        self.tools.insert(
            definition.name.clone(),
            Entry {
                tool: Arc::new(tool),
                definition,
            },
        );
        Ok(())
    }

    /// Registers a tool.
    ///
    /// # Panics
    ///
    /// Panics if [`try_register`](Self::try_register) rejects the tool.
    pub fn register(&mut self, tool: impl Tool) {
        if let Err(err) = self.try_register(tool) {
            panic!("{err}");
        }
    }

    /// Validates `args` against the tool's schema, then executes it.
    ///
    /// The returned future owns everything it needs, so it can be moved onto
    /// another task.
    pub fn execute(&self, name: &str, args: serde_json::Value) -> ToolFuture<'static> {
        let resolved = self
            .tools
            .get(name)
            .map(|entry| (Arc::clone(&entry.tool), entry.definition.parameters.clone()));
        let name = name.to_string();
        Box::pin(async move {
            let (tool, schema) =
                resolved.ok_or_else(|| ToolError::not_found(format!("unknown tool: {name}")))?;
            validate_arguments(&schema, &args).map_err(ToolError::Validation)?;
            tool.execute(args).await
        })
    }

    /// Returns tool definitions for all registered tools, in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|entry| entry.definition.clone())
            .collect()
    }

    /// Returns a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|entry| entry.tool.as_ref())
    }

    /// Returns whether a tool with the given name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the names of all registered tools.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn check_definition(definition: &ToolDefinition) -> Result<(), RegistrationError> {
    let name = &definition.name;
    let name_ok = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !name_ok {
        return Err(RegistrationError::InvalidName(name.clone()));
    }

    let invalid = |reason: &str| RegistrationError::InvalidSchema {
        tool: name.clone(),
        reason: reason.to_string(),
    };
    let schema = definition
        .parameters
        .as_object()
        .ok_or_else(|| invalid("schema must be a JSON object"))?;
    if schema.get("type").and_then(|t| t.as_str()) != Some("object") {
        return Err(invalid("schema type must be \"object\""));
    }
    if let Some(properties) = schema.get("properties")
        && !properties.is_object()
    {
        return Err(invalid("\"properties\" must be an object"));
    }
    if let Some(required) = schema.get("required") {
        let properties = schema.get("properties").and_then(|p| p.as_object());
        let listed = required
            .as_array()
            .ok_or_else(|| invalid("\"required\" must be an array"))?;
        for field in listed {
            let field = field
                .as_str()
                .ok_or_else(|| invalid("\"required\" entries must be strings"))?;
            if properties.is_none_or(|p| !p.contains_key(field)) {
                return Err(invalid(&format!("required field '{field}' is not declared")));
            }
        }
    }
    Ok(())
}
