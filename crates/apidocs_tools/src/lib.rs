//! Tool framework for the documentation assistant.
//!
//! Tools are named operations with a JSON-schema input declaration. The
//! [`ToolRegistry`] checks definitions when tools are registered and checks
//! arguments against the declared schema before any tool body runs, so a
//! malformed call never reaches a handler.
//!
//! # Architecture
//!
//! - [`Tool`] - trait for executable tools with JSON schema
//! - [`ToolRegistry`] - stores, validates and dispatches tools
//! - [`FunctionMetadata`] / [`ParameterInfo`] - schema building
//! - [`ToolArgs`] - typed extraction of validated arguments
//! - [`validate`] - the argument checker behind the registry

pub mod error;
pub mod param;
pub mod registry;
pub mod schema;
pub mod tool;
pub mod validate;

pub use error::{FieldError, RegistrationError, ToolError, ValidationErrors};
pub use param::ToolArgs;
pub use registry::ToolRegistry;
pub use schema::{FunctionMetadata, ParameterInfo};
pub use tool::Tool;
