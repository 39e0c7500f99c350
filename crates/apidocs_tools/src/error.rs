//! Error types for tool registration and execution.

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// A single argument that failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Path to the offending value, e.g. `provider` or `methods[1]`.
    pub field: String,
    /// What is wrong with it.
    pub reason: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl core::fmt::Display for FieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.field, self.reason)
        }
    }
}

/// Every field error found in one set of arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    /// Whether no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The recorded errors.
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    pub(crate) fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.push(FieldError::new(field, reason));
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Errors that can occur during tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments do not satisfy the tool's input schema.
    #[error("invalid arguments: {0}")]
    Validation(ValidationErrors),

    /// The tool, or something the tool looked up, does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The tool body failed.
    #[error("execution error: {0}")]
    Execution(String),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolError {
    /// Creates a [`Validation`](Self::Validation) error for one field.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors(vec![FieldError::new(field, reason)]))
    }

    /// Creates a [`NotFound`](Self::NotFound).
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Creates an [`Execution`](Self::Execution).
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Short machine-readable category.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Execution(_) => "execution_error",
            Self::Serialization(_) => "serialization_error",
        }
    }

    /// Structured form handed back to the model as a tool result.
    ///
    /// ```
    /// use apidocs_tools::ToolError;
    ///
    /// let payload = ToolError::invalid_field("limit", "must be at least 1").to_payload();
    /// assert_eq!(payload["error"]["kind"], "validation_error");
    /// assert_eq!(payload["error"]["fields"][0]["field"], "limit");
    /// ```
    #[must_use]
    pub fn to_payload(&self) -> Value {
        let mut error = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let (Self::Validation(errors), Some(obj)) = (self, error.as_object_mut()) {
            obj.insert("fields".to_string(), json!(errors));
        }
        json!({ "error": error })
    }
}

/// A tool definition rejected at registration time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// Another tool already uses this name.
    #[error("tool '{0}' is already registered")]
    Duplicate(String),

    /// Tool names must be non-empty `[A-Za-z0-9_-]` strings.
    #[error("invalid tool name '{0}'")]
    InvalidName(String),

    /// The parameter schema is not an object schema.
    #[error("tool '{tool}' has an invalid input schema: {reason}")]
    InvalidSchema {
        /// Offending tool.
        tool: String,
        /// Why the schema was rejected.
        reason: String,
    },
}
