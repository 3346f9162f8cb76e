//! Tool schemas and tool calls.
//!
//! A [`Tool`] is the machine-readable descriptor the model uses to decide
//! when to invoke a function: a name, a description, and a JSON Schema for
//! its parameters. A [`ToolCall`] is the model's request to invoke one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// A single property in a function parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Property {
    /// The JSON type (e.g. "string", "number").
    #[serde(rename = "type")]
    pub prop_type: String,
    /// Natural-language description of this parameter, read by the model.
    pub description: String,
}

impl Property {
    /// Creates a string property.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: description.into(),
        }
    }

    /// Creates a number property.
    #[must_use]
    pub fn number(description: impl Into<String>) -> Self {
        Self {
            prop_type: "number".to_string(),
            description: description.into(),
        }
    }
}

/// The parameter schema of a function, JSON Schema object style.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Parameters {
    /// Always "object".
    #[serde(rename = "type")]
    pub param_type: String,
    /// Parameter name to property definition.
    pub properties: HashMap<String, Property>,
    /// Names of required parameters.
    pub required: Vec<String>,
}

impl Parameters {
    /// Creates an object schema with the given properties and required list.
    #[must_use]
    pub fn new(properties: HashMap<String, Property>, required: Vec<String>) -> Self {
        Self {
            param_type: "object".to_string(),
            properties,
            required,
        }
    }

    /// An empty object schema, for tools that take no arguments.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(HashMap::new(), Vec::new())
    }

    /// Fallible conversion to `serde_json::Value`.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if serialization fails (not expected in
    /// practice; every field serializes infallibly).
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl From<Parameters> for serde_json::Value {
    fn from(params: Parameters) -> Self {
        match serde_json::to_value(&params) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("parameter schema serialization unexpectedly failed: {e}");
                Self::Null
            }
        }
    }
}

/// A function the model may invoke.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Function {
    /// Function name, as the model will reference it.
    pub name: String,
    /// What the function does, read by the model when planning calls.
    pub description: String,
    /// JSON Schema of the parameters.
    pub parameters: serde_json::Value,
}

/// A tool exposed to the model, wrapping a [`Function`].
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder, Eq, PartialEq)]
pub struct Tool {
    /// The tool type; only "function" today.
    #[serde(rename = "type")]
    #[builder(default = "function".to_string())]
    pub r#type: String,
    /// The function definition.
    pub function: Function,
}

/// A function invocation: a name plus the raw argument JSON text.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// The name of the function being called.
    pub name: String,
    /// Arguments as a single JSON string, passed through from the API as-is.
    pub arguments: String,
}

impl FunctionCall {
    /// The argument text, substituting `"{}"` when empty.
    #[must_use]
    pub fn arguments_json(&self) -> &str {
        if self.arguments.is_empty() {
            "{}"
        } else {
            &self.arguments
        }
    }
}

/// A complete tool call from the model.
///
/// Arguments are not validated here; the executor parses them at invocation
/// time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// Unique identifier, echoed back in the tool result message.
    pub id: String,
    /// The function being invoked.
    pub function: FunctionCall,
    /// The call type, typically "function".
    pub call_type: String,
}

impl ToolCall {
    /// Creates a tool call with a generated ID.
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
            call_type: "function".to_string(),
        }
    }
}


#[cfg(test)]
mod proptests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fuzz_tool_call_deserialization(data in prop::collection::vec(any::<u8>(), 0..1000)) {
            // Must not panic on arbitrary bytes
            let _ = serde_json::from_slice::<ToolCall>(&data);
        }

        #[test]
        fn function_call_roundtrip(name in ".*", args in ".*") {
            let call = FunctionCall { name, arguments: args };
            let json = serde_json::to_string(&call).unwrap();
            let parsed: FunctionCall = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(call, parsed);
        }

        #[test]
        fn malformed_argument_text_is_preserved(name in r"[a-z_]{1,30}", arg_idx in 0usize..6) {
            let malformed = ["{", "}", "null", r#"{"incomplete": "#, "", "   "];
            let args = malformed[arg_idx % malformed.len()];
            let call = ToolCall::new(name, args);
            prop_assert_eq!(call.function.arguments.as_str(), args);
        }
    }
}
