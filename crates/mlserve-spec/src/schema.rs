//! Task schema types and their self-validation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ValidationError, ValidationResult};
use crate::input::InputType;
use crate::parameter::{EnumVal, ParameterDescriptor};

/// One named input of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSchema {
    /// Key used in the `inputs` object and as the CLI flag.
    pub key: String,
    /// Display label.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub input_type: InputType,
}

impl InputSchema {
    pub fn new(key: impl Into<String>, label: impl Into<String>, input_type: InputType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            subtitle: None,
            input_type,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// One named parameter of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSchema {
    /// Key used in the `parameters` object and as the CLI flag.
    pub key: String,
    /// Display label.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub value: ParameterDescriptor,
}

impl ParameterSchema {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        value: ParameterDescriptor,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            subtitle: None,
            value,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// Declares the inputs and parameters an endpoint accepts.
///
/// The same value drives HTTP payload validation, the sample payload, and the
/// derived CLI subcommand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSchema {
    pub inputs: Vec<InputSchema>,
    pub parameters: Vec<ParameterSchema>,
}

impl TaskSchema {
    /// Creates a new task schema builder.
    pub fn builder() -> TaskSchemaBuilder {
        TaskSchemaBuilder::default()
    }

    /// Parses a task schema from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the task schema to a JSON value.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn input(&self, key: &str) -> Option<&InputSchema> {
        self.inputs.iter().find(|i| i.key == key)
    }

    pub fn parameter(&self, key: &str) -> Option<&ParameterSchema> {
        self.parameters.iter().find(|p| p.key == key)
    }

    /// Input keys in declaration order.
    pub fn input_keys(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|i| i.key.as_str())
    }

    /// Parameter keys in declaration order.
    pub fn parameter_keys(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.key.as_str())
    }

    /// Checks the schema for internal consistency.
    ///
    /// All problems are collected; the schema is usable only when the result
    /// is ok.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::success();

        let mut seen = HashSet::new();
        for (i, input) in self.inputs.iter().enumerate() {
            let path = format!("inputs[{}].key", i);
            validate_key(&input.key, &path, &mut seen, "input", &mut result);
        }

        let mut seen = HashSet::new();
        for (i, param) in self.parameters.iter().enumerate() {
            let path = format!("parameters[{}].key", i);
            validate_key(&param.key, &path, &mut seen, "parameter", &mut result);
            validate_descriptor(&param.value, &format!("parameters[{}].value", i), &mut result);
        }

        result
    }
}

fn validate_key<'a>(
    key: &'a str,
    path: &str,
    seen: &mut HashSet<&'a str>,
    kind: &str,
    result: &mut ValidationResult,
) {
    if key.is_empty() {
        result.add_error(ValidationError::with_path(
            ErrorCode::EmptyKey,
            format!("{} key must not be empty", kind),
            path,
        ));
        return;
    }
    if !seen.insert(key) {
        result.add_error(ValidationError::with_path(
            ErrorCode::DuplicateKey,
            format!("duplicate {} key '{}'", kind, key),
            path,
        ));
    }
}

fn validate_descriptor(descriptor: &ParameterDescriptor, path: &str, result: &mut ValidationResult) {
    match descriptor {
        ParameterDescriptor::Text { .. }
        | ParameterDescriptor::Float { .. }
        | ParameterDescriptor::Int { .. } => {}
        ParameterDescriptor::Enum {
            enum_vals, default, ..
        } => validate_enum(enum_vals, default.as_deref(), path, result),
        ParameterDescriptor::RangedFloat { range, default } => {
            if !(range.min.is_finite() && range.max.is_finite()) {
                result.add_error(ValidationError::with_path(
                    ErrorCode::InvertedRange,
                    "range bounds must be finite",
                    format!("{}.range", path),
                ));
            } else if range.min > range.max {
                result.add_error(ValidationError::with_path(
                    ErrorCode::InvertedRange,
                    format!("min {} is greater than max {}", range.min, range.max),
                    format!("{}.range", path),
                ));
            } else if let Some(d) = default {
                if !range.contains(*d) {
                    result.add_error(ValidationError::with_path(
                        ErrorCode::DefaultOutOfRange,
                        format!("default {} is outside [{}, {}]", d, range.min, range.max),
                        format!("{}.default", path),
                    ));
                }
            }
        }
        ParameterDescriptor::RangedInt { range, default } => {
            if range.min > range.max {
                result.add_error(ValidationError::with_path(
                    ErrorCode::InvertedRange,
                    format!("min {} is greater than max {}", range.min, range.max),
                    format!("{}.range", path),
                ));
            } else if let Some(d) = default {
                if !range.contains(*d) {
                    result.add_error(ValidationError::with_path(
                        ErrorCode::DefaultOutOfRange,
                        format!("default {} is outside [{}, {}]", d, range.min, range.max),
                        format!("{}.default", path),
                    ));
                }
            }
        }
    }
}

fn validate_enum(
    enum_vals: &[EnumVal],
    default: Option<&str>,
    path: &str,
    result: &mut ValidationResult,
) {
    if enum_vals.is_empty() {
        result.add_error(ValidationError::with_path(
            ErrorCode::EmptyEnum,
            "enum parameter must declare at least one value",
            format!("{}.enum_vals", path),
        ));
        return;
    }

    let mut seen = HashSet::new();
    for (i, val) in enum_vals.iter().enumerate() {
        if !seen.insert(val.key.as_str()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::DuplicateKey,
                format!("duplicate enum key '{}'", val.key),
                format!("{}.enum_vals[{}].key", path, i),
            ));
        }
    }

    if let Some(default) = default {
        if !seen.contains(default) {
            result.add_error(ValidationError::with_path(
                ErrorCode::UnknownEnumDefault,
                format!("default '{}' is not one of the enum keys", default),
                format!("{}.default", path),
            ));
        }
    }
}

/// Builder for constructing [`TaskSchema`] instances.
#[derive(Debug, Clone, Default)]
pub struct TaskSchemaBuilder {
    inputs: Vec<InputSchema>,
    parameters: Vec<ParameterSchema>,
}

impl TaskSchemaBuilder {
    /// Adds an input.
    pub fn input(mut self, input: InputSchema) -> Self {
        self.inputs.push(input);
        self
    }

    /// Adds a parameter.
    pub fn parameter(mut self, parameter: ParameterSchema) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets all parameters.
    pub fn parameters(mut self, parameters: Vec<ParameterSchema>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Builds the task schema.
    pub fn build(self) -> TaskSchema {
        TaskSchema {
            inputs: self.inputs,
            parameters: self.parameters,
        }
    }
}
