//! Parameter descriptors and the shared coercion helpers.
//!
//! Every tool parameter travels as a string. A [`ParamSpec`] declares the
//! parameter for callers (advertised as `{"type": "string"}`) and records the
//! semantic kind and the label used in "required" errors. [`ToolArgs`] holds
//! the caller's values for one invocation. [`ToolArgs::validate`] checks every
//! supplied value against its declared kind before a handler runs; handlers
//! then coerce on demand.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use super::error::{ToolError, ToolResult};

/// Semantic type of a string-encoded parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Used verbatim.
    Text,
    /// Parsed with leading-integer semantics.
    Integer,
    /// `"true"` enables, anything else disables.
    Boolean,
    /// Decoded as JSON.
    Json,
}

/// Declaration of one tool parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
    /// Label for the "required" error; `None` for optional parameters.
    pub required: Option<&'static str>,
}

impl ParamSpec {
    /// An optional text parameter.
    pub const fn text(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind: ParamKind::Text,
            required: None,
        }
    }

    pub const fn integer(self) -> Self {
        Self {
            kind: ParamKind::Integer,
            ..self
        }
    }

    pub const fn boolean(self) -> Self {
        Self {
            kind: ParamKind::Boolean,
            ..self
        }
    }

    pub const fn json(self) -> Self {
        Self {
            kind: ParamKind::Json,
            ..self
        }
    }

    /// Mark the parameter as required; `label` names it in the error message.
    pub const fn required(self, label: &'static str) -> Self {
        Self {
            required: Some(label),
            ..self
        }
    }
}

/// Build the JSON schema advertised for a parameter list.
pub fn input_schema(params: &[ParamSpec]) -> Map<String, Value> {
    let mut properties = Map::new();
    for param in params {
        properties.insert(
            param.name.to_string(),
            json!({ "type": "string", "description": param.description }),
        );
    }

    let required: Vec<&str> = params
        .iter()
        .filter(|p| p.required.is_some())
        .map(|p| p.name)
        .collect();

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }
    schema
}

/// Arguments of a single tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolArgs {
    values: HashMap<String, String>,
    params: &'static [ParamSpec],
}

impl ToolArgs {
    pub fn new(values: HashMap<String, String>, params: &'static [ParamSpec]) -> Self {
        Self { values, params }
    }

    /// Build from a JSON object, stringifying non-string values.
    ///
    /// `null` values are treated as absent.
    pub fn from_json(arguments: &Map<String, Value>, params: &'static [ParamSpec]) -> Self {
        let values = arguments
            .iter()
            .filter_map(|(key, value)| match value {
                Value::Null => None,
                Value::String(s) => Some((key.clone(), s.clone())),
                other => Some((key.clone(), other.to_string())),
            })
            .collect();
        Self { values, params }
    }

    fn label(&self, name: &str) -> String {
        self.params
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.required)
            .map(str::to_string)
            .unwrap_or_else(|| name.to_string())
    }

    /// The value of `name`, treating an empty string as absent.
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The value of `name`, or a "required" error naming it.
    pub fn required(&self, name: &str) -> ToolResult<&str> {
        self.optional(name)
            .ok_or_else(|| ToolError::missing(self.label(name)))
    }

    /// The value of `name`, falling back to a configured default.
    ///
    /// Fails with `"<label> required"` when both are empty.
    pub fn or_configured<'a>(
        &'a self,
        name: &str,
        configured: &'a str,
        label: &str,
    ) -> ToolResult<&'a str> {
        match self.optional(name) {
            Some(v) => Ok(v),
            None if !configured.is_empty() => Ok(configured),
            None => Err(ToolError::missing(label)),
        }
    }

    /// `true` only when the value is exactly `"true"`.
    pub fn flag(&self, name: &str) -> bool {
        self.optional(name) == Some("true")
    }

    /// Check each supplied value against its declared [`ParamKind`].
    ///
    /// Integers must parse and fit in an `i64`; JSON must decode. Presence is
    /// checked by the handler.
    pub fn validate(&self) -> ToolResult<()> {
        for param in self.params {
            match param.kind {
                ParamKind::Integer => {
                    self.integer(param.name)?;
                }
                ParamKind::Json => {
                    self.json::<Value>(param.name)?;
                }
                ParamKind::Text | ParamKind::Boolean => {}
            }
        }
        Ok(())
    }

    /// Parse `name` as an integer if present.
    pub fn integer(&self, name: &str) -> ToolResult<Option<i64>> {
        self.optional(name)
            .map(|raw| {
                leading_int(raw).map_err(|e| {
                    let problem = match e {
                        IntError::NoDigits => "is not an integer",
                        IntError::OutOfRange => "is out of range",
                    };
                    ToolError::invalid_arguments(format!("'{}' {}: {}", name, problem, raw))
                })
            })
            .transpose()
    }

    /// Parse `name` as an integer, using `default` when absent.
    pub fn integer_or(&self, name: &str, default: i64) -> ToolResult<i64> {
        Ok(self.integer(name)?.unwrap_or(default))
    }

    /// Decode `name` as JSON if present.
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> ToolResult<Option<T>> {
        self.optional(name)
            .map(|raw| serde_json::from_str(raw).map_err(ToolError::from))
            .transpose()
    }

    /// Decode a required JSON parameter.
    pub fn required_json<T: DeserializeOwned>(&self, name: &str) -> ToolResult<T> {
        let raw = self.required(name)?;
        Ok(serde_json::from_str(raw)?)
    }
}

/// Why a value yields no integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntError {
    NoDigits,
    OutOfRange,
}

/// Leading-integer parse: optional whitespace and sign, then digits.
///
/// Trailing garbage is ignored (`"60s"` is 60).
pub fn leading_int(raw: &str) -> Result<i64, IntError> {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => ("-", &trimmed[1..]),
        Some(b'+') => ("", &trimmed[1..]),
        _ => ("", trimmed),
    };
    let digits: &str = rest
        .find(|c: char| !c.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);
    if digits.is_empty() {
        return Err(IntError::NoDigits);
    }
    format!("{}{}", sign, digits)
        .parse()
        .map_err(|_| IntError::OutOfRange)
}

/// [`leading_int`] for lenient readers: any failure is `None`.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    leading_int(raw).ok()
}
