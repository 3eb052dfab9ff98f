//! MCP (Model Context Protocol) tool interface
//!
//! Standardized tool surface: a schema for discovery, JSON in, a content
//! block list out.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool error with MCP error codes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
}

impl ToolError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidParams,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InternalError,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::MethodNotFound,
            message: message.into(),
        }
    }

    pub fn timeout(tool_name: &str, timeout_secs: u64) -> Self {
        Self {
            code: ErrorCode::InternalError,
            message: format!("Tool '{}' timed out after {}s", tool_name, timeout_secs),
        }
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ToolError {}

/// MCP error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

/// Tool output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn json(value: impl Serialize) -> Self {
        let text = serde_json::to_string_pretty(&value).unwrap_or_default();
        Self {
            content: vec![ContentBlock::Text { text }],
            is_error: false,
        }
    }

    /// First text block parsed back as JSON (tests and callers)
    pub fn as_json(&self) -> Option<Value> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => serde_json::from_str(text).ok(),
            _ => None,
        })
    }
}

/// Content block types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Resource { uri: String, mime_type: Option<String> },
}

/// Tool schema (JSON Schema format)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

/// Input schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl InputSchema {
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: Vec::new(),
        }
    }

    pub fn property(mut self, name: &str, schema: PropertySchema, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }
}

/// Property schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub prop_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
}

impl PropertySchema {
    fn typed(prop_type: &str, description: impl Into<String>) -> Self {
        Self {
            prop_type: prop_type.to_string(),
            description: Some(description.into()),
            default: None,
            enum_values: None,
            items: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::typed("string", description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::typed("integer", description)
    }

    pub fn object(description: impl Into<String>) -> Self {
        Self::typed("object", description)
    }

    pub fn string_array(description: impl Into<String>) -> Self {
        let mut schema = Self::typed("array", description);
        schema.items = Some(Box::new(Self::typed("string", "")));
        schema
    }

    pub fn enum_type(description: impl Into<String>, values: Vec<String>) -> Self {
        let mut schema = Self::typed("string", description);
        schema.enum_values = Some(values);
        schema
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Tool trait
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get tool name
    fn name(&self) -> &str;

    /// Get tool description
    fn description(&self) -> &str;

    /// Get input schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool
    ///
    /// Domain failures (missing configuration, I/O errors) are reported in
    /// the returned result's `status` field; `Err` is reserved for inputs
    /// that do not match the schema.
    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;

    /// Validate input against the schema's required fields and types
    fn validate(&self, input: &Value) -> Result<(), ToolError> {
        let schema = self.schema();

        if let Value::Object(obj) = input {
            for required in &schema.input_schema.required {
                if !obj.contains_key(required) {
                    return Err(ToolError::invalid_params(format!(
                        "Missing required field: {}",
                        required
                    )));
                }
            }

            for (name, value) in obj {
                if let Some(prop) = schema.input_schema.properties.get(name) {
                    validate_property(name, value, prop)?;
                }
                // Unknown properties are allowed.
            }

            Ok(())
        } else if schema.input_schema.properties.is_empty() {
            Ok(())
        } else {
            Err(ToolError::invalid_params("Input must be an object"))
        }
    }

    /// Per-tool execution timeout in seconds
    fn timeout_secs(&self) -> u64 {
        30
    }
}

/// Validate a property value against its schema
fn validate_property(name: &str, value: &Value, schema: &PropertySchema) -> Result<(), ToolError> {
    let type_valid = match schema.prop_type.as_str() {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    };

    if !type_valid {
        return Err(ToolError::invalid_params(format!(
            "Field '{}' must be of type '{}'",
            name, schema.prop_type
        )));
    }

    if let Some(enum_values) = &schema.enum_values {
        if let Some(s) = value.as_str() {
            if !enum_values.iter().any(|v| v == s) {
                return Err(ToolError::invalid_params(format!(
                    "Field '{}' must be one of: [{}], got '{}'",
                    name,
                    enum_values.join(", "),
                    s
                )));
            }
        }
    }

    Ok(())
}
