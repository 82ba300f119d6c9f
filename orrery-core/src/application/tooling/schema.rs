//! Tool input schemas and argument validation.

use super::descriptor::ToolDescriptor;
use super::error::{ToolError, ValidationError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Whether arguments not declared by the schema are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    #[default]
    Open,
    Strict,
}

/// Primitive kind declared for one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    /// No `type`, or one this validator does not model. Anything goes.
    Any,
}

impl PropertyKind {
    fn from_schema(schema: &Value) -> Self {
        match schema.get("type").and_then(Value::as_str) {
            Some("string") => PropertyKind::String,
            Some("number") => PropertyKind::Number,
            Some("integer") => PropertyKind::Integer,
            Some("boolean") => PropertyKind::Boolean,
            Some("object") => PropertyKind::Object,
            Some("array") => PropertyKind::Array,
            _ => PropertyKind::Any,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::String => "string",
            PropertyKind::Number => "number",
            PropertyKind::Integer => "integer",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Object => "object",
            PropertyKind::Array => "array",
            PropertyKind::Any => "any",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            PropertyKind::String => value.is_string(),
            PropertyKind::Number => value.is_number(),
            PropertyKind::Integer => exact_i64(value).is_some(),
            PropertyKind::Boolean => value.is_boolean(),
            PropertyKind::Object => value.is_object(),
            PropertyKind::Array => value.is_array(),
            PropertyKind::Any => true,
        }
    }
}

/// Object schema of a tool's arguments.
///
/// Only the top level is checked: declared property kinds and the `required`
/// list. The raw schema is kept verbatim so it can be shown to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSchema {
    raw: Value,
    properties: Vec<(String, PropertyKind)>,
    required: Vec<String>,
}

impl InputSchema {
    pub fn from_value(raw: Value) -> Self {
        let properties = raw
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, schema)| (name.clone(), PropertyKind::from_schema(schema)))
                    .collect()
            })
            .unwrap_or_default();
        let required = raw
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            raw,
            properties,
            required,
        }
    }

    /// Schema with no declared fields.
    pub fn empty() -> Self {
        Self::from_value(json!({ "type": "object", "properties": {} }))
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn property(&self, name: &str) -> Option<PropertyKind> {
        self.properties
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, kind)| *kind)
    }

    pub fn validate(
        &self,
        tool: &str,
        raw_args: Value,
        strictness: Strictness,
    ) -> Result<ToolArgs, ValidationError> {
        let values = match raw_args {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(ValidationError::NotAnObject {
                    tool: tool.to_string(),
                    found: json_type_name(&other),
                });
            }
        };

        for field in &self.required {
            if !values.contains_key(field) {
                return Err(ValidationError::MissingField {
                    tool: tool.to_string(),
                    field: field.clone(),
                });
            }
        }

        for (field, value) in &values {
            match self.property(field) {
                Some(kind) if !kind.accepts(value) => {
                    return Err(ValidationError::TypeMismatch {
                        tool: tool.to_string(),
                        field: field.clone(),
                        expected: kind.as_str(),
                        found: json_type_name(value),
                    });
                }
                Some(_) => {}
                None if strictness == Strictness::Strict => {
                    return Err(ValidationError::UnknownField {
                        tool: tool.to_string(),
                        field: field.clone(),
                    });
                }
                None => {}
            }
        }

        Ok(ToolArgs {
            tool: tool.to_string(),
            values,
        })
    }
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::empty()
    }
}

/// Validate `raw_args` against the descriptor's schema. Pure; never calls the tool.
pub fn validate(
    descriptor: &ToolDescriptor,
    raw_args: Value,
    strictness: Strictness,
) -> Result<ToolArgs, ValidationError> {
    descriptor
        .input_schema()
        .validate(descriptor.name(), raw_args, strictness)
}

/// Validated arguments handed to a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArgs {
    tool: String,
    values: Map<String, Value>,
}

impl ToolArgs {
    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn str(&self, key: &str) -> Result<&str, ToolError> {
        let value = self.require(key)?;
        value
            .as_str()
            .ok_or_else(|| self.mismatch(key, "string", value))
    }

    pub fn opt_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn i64(&self, key: &str) -> Result<i64, ToolError> {
        let value = self.require(key)?;
        exact_i64(value).ok_or_else(|| self.mismatch(key, "integer", value))
    }

    pub fn f64(&self, key: &str) -> Result<f64, ToolError> {
        let value = self.require(key)?;
        value
            .as_f64()
            .ok_or_else(|| self.mismatch(key, "number", value))
    }

    pub fn bool(&self, key: &str) -> Result<bool, ToolError> {
        let value = self.require(key)?;
        value
            .as_bool()
            .ok_or_else(|| self.mismatch(key, "boolean", value))
    }

    /// Deserialize the whole argument object into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|err| ToolError::execution(&self.tool, format!("invalid arguments: {err}")))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    fn require(&self, key: &str) -> Result<&Value, ToolError> {
        self.values.get(key).ok_or_else(|| {
            ValidationError::MissingField {
                tool: self.tool.clone(),
                field: key.to_string(),
            }
            .into()
        })
    }

    fn mismatch(&self, key: &str, expected: &'static str, value: &Value) -> ToolError {
        ValidationError::TypeMismatch {
            tool: self.tool.clone(),
            field: key.to_string(),
            expected,
            found: json_type_name(value),
        }
        .into()
    }
}

/// The value as an `i64`, when that is lossless. Whole floats such as `2.0`
/// qualify; anything outside the `i64` range does not.
fn exact_i64(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    if let Some(number) = value.as_u64() {
        return i64::try_from(number).ok();
    }
    // 2^63 is exactly representable; i64::MAX as f64 rounds up to it.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    value
        .as_f64()
        .filter(|number| number.fract() == 0.0 && *number >= -BOUND && *number < BOUND)
        .map(|number| number as i64)
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
