//! Typed access to validated tool arguments.

use crate::error::ToolError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// The JSON argument object of one tool call.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    parameters: Map<String, Value>,
}

impl ToolArgs {
    /// Wraps an argument value, which must be a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `args` is not an object.
    pub fn from_value(args: Value) -> Result<Self, ToolError> {
        match args {
            Value::Object(parameters) => Ok(Self { parameters }),
            Value::Null => Ok(Self::default()),
            _ => Err(ToolError::invalid_field("arguments", "must be an object")),
        }
    }

    /// Deserializes a required parameter by name.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the parameter when it is missing or
    /// has the wrong shape.
    pub fn required<T: DeserializeOwned>(&self, name: &str) -> Result<T, ToolError> {
        match self.optional(name)? {
            Some(value) => Ok(value),
            None => Err(ToolError::invalid_field(name, "is required")),
        }
    }

    /// Deserializes an optional parameter by name. Missing and null both yield `None`.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the parameter when it has the wrong shape.
    pub fn optional<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ToolError> {
        match self.parameters.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|err| ToolError::invalid_field(name, err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_extraction() {
        let args = ToolArgs::from_value(json!({"provider": "petstore", "limit": 3, "method": null}))
            .expect("object");

        assert_eq!(args.required::<String>("provider").expect("present"), "petstore");
        assert_eq!(args.optional::<u32>("limit").expect("valid"), Some(3));
        assert_eq!(args.optional::<String>("method").expect("valid"), None);
        assert!(matches!(
            args.required::<String>("query"),
            Err(ToolError::Validation(errors)) if errors.fields()[0].field == "query"
        ));
        assert!(args.required::<u32>("provider").is_err());
    }

    #[test]
    fn rejects_non_objects() {
        assert!(ToolArgs::from_value(json!([1, 2])).is_err());
        assert!(ToolArgs::from_value(Value::Null).is_ok());
    }
}
