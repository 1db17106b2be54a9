//! Declared input schemas and single-pass argument validation.
//!
//! A tool declares its fields once; the same declaration renders the JSON
//! Schema advertised in `tools/list` and validates incoming arguments.

use crate::error::FieldError;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Non-empty string
    String,
    /// Integer greater than zero
    PositiveInteger,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub description: Option<&'static str>,
    pub default: Option<&'static str>,
}

impl FieldSpec {
    pub fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
            description: None,
            default: None,
        }
    }

    pub fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, ty)
        }
    }

    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    /// Value substituted when an optional string field is absent
    pub fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = match self.ty {
            FieldType::String => json!({ "type": "string", "minLength": 1 }),
            FieldType::PositiveInteger => json!({ "type": "integer", "minimum": 1 }),
        };
        if let Some(description) = self.description {
            schema["description"] = Value::String(description.to_string());
        }
        if let Some(default) = self.default {
            schema["default"] = Value::String(default.to_string());
        }
        schema
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Render as a JSON Schema object
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate every declared field in one pass.
    ///
    /// Returns the defaulted arguments, or every field-level error found.
    /// Keys not declared in the schema are ignored.
    pub fn validate(&self, args: &Value) -> Result<ValidatedArgs, Vec<FieldError>> {
        let empty = Map::new();
        let object = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(vec![FieldError::new(
                    "arguments",
                    format!("must be an object, got {}", type_name(other)),
                )])
            }
        };

        let mut values = HashMap::new();
        let mut errors = Vec::new();

        for spec in &self.fields {
            match object.get(spec.name) {
                None | Some(Value::Null) => {
                    if let Some(default) = spec.default {
                        values.insert(spec.name, ArgValue::Str(default.to_string()));
                    } else if spec.required {
                        errors.push(FieldError::new(spec.name, "is required"));
                    }
                }
                Some(value) => match check_value(spec.ty, value) {
                    Ok(v) => {
                        values.insert(spec.name, v);
                    }
                    Err(message) => errors.push(FieldError::new(spec.name, message)),
                },
            }
        }

        if errors.is_empty() {
            Ok(ValidatedArgs { values })
        } else {
            Err(errors)
        }
    }
}

fn check_value(ty: FieldType, value: &Value) -> Result<ArgValue, String> {
    match ty {
        FieldType::String => match value {
            Value::String(s) if s.trim().is_empty() => Err("must not be empty".to_string()),
            Value::String(s) => Ok(ArgValue::Str(s.clone())),
            other => Err(format!("must be a string, got {}", type_name(other))),
        },
        FieldType::PositiveInteger => match value.as_u64() {
            Some(n) if n > 0 => Ok(ArgValue::Int(n)),
            _ if value.is_number() => Err(format!("must be a positive integer, got {}", value)),
            _ => Err(format!(
                "must be a positive integer, got {}",
                type_name(value)
            )),
        },
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Int(u64),
}

/// Arguments that passed schema validation, with defaults applied
#[derive(Debug, Clone, Default)]
pub struct ValidatedArgs {
    values: HashMap<&'static str, ArgValue>,
}

impl ValidatedArgs {
    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<u64> {
        match self.values.get(name) {
            Some(ArgValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Fetch a required string; a missing value means the schema and the
    /// reader disagree
    pub fn require_str(&self, name: &str) -> Result<String, FieldError> {
        self.str(name)
            .map(str::to_string)
            .ok_or_else(|| FieldError::new(name, "is required"))
    }

    pub fn require_int(&self, name: &str) -> Result<u64, FieldError> {
        self.int(name)
            .ok_or_else(|| FieldError::new(name, "is required"))
    }
}

/// A typed argument record for one tool
pub trait ToolInput: Sized {
    fn schema() -> InputSchema;

    fn from_validated(args: &ValidatedArgs) -> Result<Self, FieldError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> InputSchema {
        InputSchema::new()
            .field(FieldSpec::required("owner", FieldType::String))
            .field(FieldSpec::required("issueNumber", FieldType::PositiveInteger))
            .field(
                FieldSpec::optional("path", FieldType::String)
                    .with_description("File path")
                    .with_default("README.md"),
            )
            .field(FieldSpec::optional("outputPath", FieldType::String))
    }

    #[test]
    fn test_valid_arguments_with_default() {
        let args = sample_schema()
            .validate(&json!({ "owner": "octo", "issueNumber": 42 }))
            .expect("should validate");

        assert_eq!(args.str("owner"), Some("octo"));
        assert_eq!(args.int("issueNumber"), Some(42));
        assert_eq!(args.str("path"), Some("README.md"));
        assert_eq!(args.str("outputPath"), None);
    }

    #[test]
    fn test_explicit_value_overrides_default() {
        let args = sample_schema()
            .validate(&json!({ "owner": "octo", "issueNumber": 1, "path": "docs/README.md" }))
            .expect("should validate");
        assert_eq!(args.str("path"), Some("docs/README.md"));
    }

    #[test]
    fn test_collects_all_field_errors() {
        let errors = sample_schema()
            .validate(&json!({ "issueNumber": "42", "outputPath": 7 }))
            .unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], FieldError::new("owner", "is required"));
        assert_eq!(errors[1].field, "issueNumber");
        assert!(errors[1].message.contains("got string"));
        assert_eq!(errors[2].field, "outputPath");
        assert!(errors[2].message.contains("must be a string"));
    }

    #[test]
    fn test_rejects_non_positive_and_fractional_numbers() {
        let schema = sample_schema();
        for bad in [json!(0), json!(-3), json!(4.5)] {
            let errors = schema
                .validate(&json!({ "owner": "octo", "issueNumber": bad }))
                .unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "issueNumber");
            assert!(errors[0].message.contains("positive integer"));
        }
    }

    #[test]
    fn test_rejects_blank_strings() {
        let errors = sample_schema()
            .validate(&json!({ "owner": "   ", "issueNumber": 1 }))
            .unwrap_err();
        assert_eq!(errors, vec![FieldError::new("owner", "must not be empty")]);
    }

    #[test]
    fn test_null_counts_as_absent() {
        let args = sample_schema()
            .validate(&json!({ "owner": "octo", "issueNumber": 3, "outputPath": null }))
            .expect("should validate");
        assert_eq!(args.str("outputPath"), None);
    }

    #[test]
    fn test_non_object_arguments() {
        let errors = sample_schema().validate(&json!(["octo"])).unwrap_err();
        assert_eq!(errors[0].field, "arguments");
        assert!(errors[0].message.contains("array"));

        // Missing arguments behave like an empty object
        let errors = sample_schema().validate(&Value::Null).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let args = sample_schema()
            .validate(&json!({ "owner": "octo", "issueNumber": 5, "verbose": true }))
            .expect("should validate");
        assert_eq!(args.int("issueNumber"), Some(5));
    }

    #[test]
    fn test_json_schema_rendering() {
        let schema = sample_schema().to_json_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["owner"]["type"], "string");
        assert_eq!(schema["properties"]["issueNumber"]["type"], "integer");
        assert_eq!(schema["properties"]["issueNumber"]["minimum"], 1);
        assert_eq!(schema["properties"]["path"]["default"], "README.md");
        assert_eq!(schema["properties"]["path"]["description"], "File path");
        assert_eq!(schema["required"], json!(["owner", "issueNumber"]));
    }
}
