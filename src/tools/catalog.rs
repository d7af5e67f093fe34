//! Tool descriptors with typed parameter schemas and argument validation.
//!
//! A descriptor is immutable once registered. The dispatcher validates every
//! call against it before a handler ever sees the arguments, so handlers can
//! rely on required parameters being present and well-typed.

use crate::types::{Error, Result};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Tool arguments as received on the wire.
pub type Arguments = Map<String, Value>;

// =============================================================================
// Parameter types
// =============================================================================

/// JSON Schema primitive type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    /// Validate a JSON value against this parameter type.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), String> {
        let ok = match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        };
        if ok {
            Ok(())
        } else {
            Err(format!(
                "expected {}, got {}",
                self.schema_name(),
                value_type_name(value)
            ))
        }
    }

    /// Name used in the advertised JSON Schema.
    pub fn schema_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Parameter definition
// =============================================================================

/// A single parameter definition for a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    /// Allowed values for string parameters. Empty means unrestricted.
    pub enum_values: Vec<String>,
    pub default: Option<Value>,
    pub required: bool,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            enum_values: Vec::new(),
            default: None,
            required: false,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::String, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer, description)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::Number, description)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean, description)
    }

    pub fn array(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::Array, description)
    }

    pub fn object(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamType::Object, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Property schema for this parameter.
    pub fn to_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), json!(self.param_type.schema_name()));
        prop.insert("description".into(), json!(self.description));
        if !self.enum_values.is_empty() {
            prop.insert("enum".into(), json!(self.enum_values));
        }
        if let Some(default) = &self.default {
            prop.insert("default".into(), default.clone());
        }
        Value::Object(prop)
    }

    fn check(&self, value: &Value) -> std::result::Result<(), String> {
        self.param_type.validate(value)?;
        if let (false, Some(s)) = (self.enum_values.is_empty(), value.as_str()) {
            if !self.enum_values.iter().any(|allowed| allowed == s) {
                return Err(format!(
                    "invalid enum value '{}', expected one of: {}",
                    s,
                    self.enum_values.join(", ")
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tool descriptor
// =============================================================================

/// Declarative metadata advertised via `tools/list`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamDef>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    /// Names of required parameters, in declaration order.
    pub fn required(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// `{type: "object", properties: {...}, required: [...]}`
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.to_schema()))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required(),
        })
    }

    /// Wire form used in `tools/list` responses.
    pub fn to_wire(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }

    /// Validate arguments against this descriptor.
    ///
    /// Returns a list of validation errors (empty = valid). Unknown extra
    /// arguments are tolerated; nulls count as absent.
    pub fn validate_arguments(&self, args: &Arguments) -> Vec<String> {
        let mut errors = Vec::new();

        for param in &self.params {
            match args.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    errors.push(format!("Missing required parameter: {}", param.name));
                }
                None | Some(Value::Null) => {}
                Some(value) => {
                    if let Err(e) = param.check(value) {
                        errors.push(format!("Parameter '{}': {}", param.name, e));
                    }
                }
            }
        }

        errors
    }

    /// Fill in default values for absent optional parameters.
    pub fn fill_defaults(&self, args: &mut Arguments) {
        for param in &self.params {
            let absent = matches!(args.get(&param.name), None | Some(Value::Null));
            if let (true, Some(default)) = (absent, &param.default) {
                args.insert(param.name.clone(), default.clone());
            }
        }
    }

    /// Validate, then fill defaults. Any violation becomes a single
    /// `Error::Validation` naming every problem found.
    pub fn prepare_arguments(&self, args: &mut Arguments) -> Result<()> {
        let errors = self.validate_arguments(args);
        if !errors.is_empty() {
            return Err(Error::validation(errors.join("; ")));
        }

        let known: HashMap<&str, &ParamDef> =
            self.params.iter().map(|p| (p.name.as_str(), p)).collect();
        for key in args.keys() {
            if !known.contains_key(key.as_str()) {
                tracing::debug!(tool = %self.name, "ignoring unknown argument: {}", key);
            }
        }

        self.fill_defaults(args);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
