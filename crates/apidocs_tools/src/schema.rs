//! Schema types for tool parameter metadata.
//!
//! [`ParameterInfo`] describes one parameter; [`FunctionMetadata`] assembles
//! parameters into the object schema advertised to the model.

use apidocs_models::llm::ToolDefinition;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Schema information for a single tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name.
    pub name: String,
    /// Parameter description shown to the model.
    pub description: Option<String>,
    /// JSON Schema for this parameter's type.
    pub schema: Value,
    /// Whether this parameter is required.
    pub required: bool,
    /// Default value for optional parameters.
    pub default_value: Option<Value>,
}

impl ParameterInfo {
    /// Creates a new required parameter with the given name and schema.
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema,
            required: true,
            default_value: None,
        }
    }

    /// Creates a required parameter whose schema is derived from `T`.
    #[must_use]
    pub fn of<T: JsonSchema>(name: impl Into<String>) -> Self {
        let mut generator = schemars::SchemaGenerator::default();
        let schema = T::json_schema(&mut generator);
        let mut schema = serde_json::to_value(schema).unwrap_or_else(|_| json!({}));
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }
        Self::new(name, schema)
    }

    /// Sets the description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the parameter optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Marks the parameter optional with a default the tool applies when absent.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.required = false;
        self.default_value = Some(default.into());
        self
    }

    /// Restricts string values to `options`.
    #[must_use]
    pub fn with_enum<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<Value> = options.into_iter().map(|s| Value::String(s.into())).collect();
        self.set("enum", Value::Array(options));
        self
    }

    /// Bounds numeric values to `[min, max]`.
    #[must_use]
    pub fn with_range(mut self, min: i64, max: i64) -> Self {
        self.set("minimum", json!(min));
        self.set("maximum", json!(max));
        self
    }

    /// Requires strings to be at least `min` characters long.
    #[must_use]
    pub fn with_min_length(mut self, min: u64) -> Self {
        self.set("minLength", json!(min));
        self
    }

    fn set(&mut self, key: &str, value: Value) {
        if let Some(obj) = self.schema.as_object_mut() {
            obj.insert(key.to_string(), value);
        }
    }
}

/// Metadata describing a tool function's name, description, and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionMetadata {
    /// Function name.
    pub name: String,
    /// Function description.
    pub description: Option<String>,
    /// LLM-visible parameters.
    pub parameters: Vec<ParameterInfo>,
    /// Full JSON Schema derived from `parameters`. Use [`Self::schema()`] to read.
    schema: Value,
}

impl FunctionMetadata {
    /// Creates new metadata with the given function name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: Vec::new(),
            schema: json!({
                "type": "object",
                "properties": {},
                "required": [],
                "additionalProperties": false
            }),
        }
    }

    /// Sets the function description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a parameter and rebuilds the schema.
    #[must_use]
    pub fn add_parameter(mut self, param: ParameterInfo) -> Self {
        self.parameters.push(param);
        self.rebuild_schema();
        self
    }

    /// Returns the full JSON Schema for the function's parameters.
    #[must_use]
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Converts this metadata into a [`ToolDefinition`].
    #[must_use]
    pub fn to_tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            parameters: self.schema.clone(),
        }
    }

    fn rebuild_schema(&mut self) {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut param_schema = param.schema.clone();
            if let Some(obj) = param_schema.as_object_mut() {
                if let Some(desc) = &param.description {
                    obj.insert("description".to_string(), Value::String(desc.clone()));
                }
                if let Some(default) = &param.default_value {
                    obj.insert("default".to_string(), default.clone());
                }
            }

            properties.insert(param.name.clone(), param_schema);

            if param.required && param.default_value.is_none() {
                required.push(param.name.clone());
            }
        }

        self.schema = json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        });
    }
}
