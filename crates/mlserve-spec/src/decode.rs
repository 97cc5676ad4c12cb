//! Payload validation and typed construction.
//!
//! Every decoder checks that the payload key set equals the declared key set
//! exactly, then builds each value in the shape dictated by the schema. A
//! decoder either returns every value or fails with one [`MarshalError`].

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{MarshalError, PayloadSection};
use crate::input::{
    BatchDirectoryInput, BatchFileInput, BatchTextInput, DirectoryInput, FileInput, Input,
    InputType, InputValues, TextInput,
};
use crate::parameter::{ParameterDescriptor, ParameterValue, ParameterValues};
use crate::path::path_syntax_errors;
use crate::schema::TaskSchema;

/// Key of the inputs object in a request body.
pub const INPUTS_KEY: &str = "inputs";
/// Key of the parameters object in a request body.
pub const PARAMETERS_KEY: &str = "parameters";

/// A fully decoded request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestBody {
    pub inputs: InputValues,
    pub parameters: ParameterValues,
}

impl RequestBody {
    /// Converts the request back into its wire form.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Decodes a full request body `{"inputs": {...}, "parameters": {...}}`.
pub fn decode_request(schema: &TaskSchema, body: &Value) -> Result<RequestBody, MarshalError> {
    let object = as_section(body, PayloadSection::Body)?;
    check_key_set(
        PayloadSection::Body,
        [INPUTS_KEY, PARAMETERS_KEY].into_iter(),
        object,
    )?;

    let inputs = decode_inputs(schema, &object[INPUTS_KEY])?;
    let parameters = decode_parameters(schema, &object[PARAMETERS_KEY])?;
    Ok(RequestBody { inputs, parameters })
}

/// Decodes the `inputs` object against the declared inputs.
pub fn decode_inputs(schema: &TaskSchema, raw: &Value) -> Result<InputValues, MarshalError> {
    let object = as_section(raw, PayloadSection::Inputs)?;
    check_key_set(PayloadSection::Inputs, schema.input_keys(), object)?;

    let mut values = InputValues::new();
    for input in &schema.inputs {
        let value = &object[input.key.as_str()];
        let decoded = decode_input(&input.key, input.input_type, value)?;
        values.insert(input.key.clone(), decoded);
    }
    Ok(values)
}

/// Decodes the `parameters` object against the declared parameters.
pub fn decode_parameters(
    schema: &TaskSchema,
    raw: &Value,
) -> Result<ParameterValues, MarshalError> {
    let object = as_section(raw, PayloadSection::Parameters)?;
    check_key_set(PayloadSection::Parameters, schema.parameter_keys(), object)?;

    let mut values = ParameterValues::new();
    for param in &schema.parameters {
        let value = &object[param.key.as_str()];
        let decoded = decode_parameter(&param.key, &param.value, value)?;
        values.insert(param.key.clone(), decoded);
    }
    Ok(values)
}

/// Decodes one input value in the shape of `input_type`.
pub fn decode_input(key: &str, input_type: InputType, value: &Value) -> Result<Input, MarshalError> {
    let field = format!("{}.{}", INPUTS_KEY, key);
    let input = match input_type {
        InputType::Text => Input::Text(text_input(key, &field, value)?),
        InputType::TextArea => Input::TextArea(text_input(key, &field, value)?),
        InputType::File => Input::File(FileInput {
            path: path_field(key, &field, value)?,
        }),
        InputType::Directory => Input::Directory(DirectoryInput {
            path: path_field(key, &field, value)?,
        }),
        InputType::BatchText => Input::BatchText(BatchTextInput {
            texts: batch(key, &field, value, "texts", text_input)?,
        }),
        InputType::BatchFile => Input::BatchFile(BatchFileInput {
            files: batch(key, &field, value, "files", |k, f, v| {
                Ok(FileInput {
                    path: path_field(k, f, v)?,
                })
            })?,
        }),
        InputType::BatchDirectory => Input::BatchDirectory(BatchDirectoryInput {
            directories: batch(key, &field, value, "directories", |k, f, v| {
                Ok(DirectoryInput {
                    path: path_field(k, f, v)?,
                })
            })?,
        }),
    };
    Ok(input)
}

/// Decodes one parameter value and checks its constraints.
pub fn decode_parameter(
    key: &str,
    descriptor: &ParameterDescriptor,
    value: &Value,
) -> Result<ParameterValue, MarshalError> {
    let field = format!("{}.{}", PARAMETERS_KEY, key);
    match descriptor {
        ParameterDescriptor::Text { .. } => Ok(ParameterValue::Text(string(key, &field, value)?)),
        ParameterDescriptor::Enum { enum_vals, .. } => {
            let chosen = string(key, &field, value)?;
            if enum_vals.iter().any(|v| v.key == chosen) {
                Ok(ParameterValue::Enum(chosen))
            } else {
                Err(MarshalError::EnumViolation {
                    key: key.to_string(),
                    value: chosen,
                    allowed: enum_vals.iter().map(|v| v.key.clone()).collect(),
                })
            }
        }
        ParameterDescriptor::Float { .. } => Ok(ParameterValue::Float(float(key, &field, value)?)),
        ParameterDescriptor::RangedFloat { range, .. } => {
            let v = float(key, &field, value)?;
            if range.contains(v) {
                Ok(ParameterValue::RangedFloat(v))
            } else {
                Err(MarshalError::RangeViolation {
                    key: key.to_string(),
                    value: number_of(value),
                    min: float_number(range.min),
                    max: float_number(range.max),
                })
            }
        }
        ParameterDescriptor::Int { .. } => Ok(ParameterValue::Int(int(key, &field, value)?)),
        ParameterDescriptor::RangedInt { range, .. } => {
            let violation = |value: Number| MarshalError::RangeViolation {
                key: key.to_string(),
                value,
                min: Number::from(range.min),
                max: Number::from(range.max),
            };
            match int(key, &field, value) {
                Ok(v) if range.contains(v) => Ok(ParameterValue::RangedInt(v)),
                Ok(v) => Err(violation(Number::from(v))),
                // Whole numbers beyond i64 lie outside every range.
                Err(_) if is_whole_number(value) => Err(violation(number_of(value))),
                Err(err) => Err(err),
            }
        }
    }
}

/// Names the JSON kind of a value, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn as_section(value: &Value, section: PayloadSection) -> Result<&Map<String, Value>, MarshalError> {
    value.as_object().ok_or_else(|| MarshalError::MalformedBody {
        section,
        found: json_kind(value).to_string(),
    })
}

fn check_key_set<'a>(
    section: PayloadSection,
    expected: impl Iterator<Item = &'a str>,
    object: &Map<String, Value>,
) -> Result<(), MarshalError> {
    let expected: Vec<&str> = expected.collect();
    let expected_set: HashSet<&str> = expected.iter().copied().collect();
    let received_set: HashSet<&str> = object.keys().map(String::as_str).collect();

    if expected_set == received_set {
        return Ok(());
    }
    Err(MarshalError::KeySetMismatch {
        section,
        expected: expected.into_iter().map(str::to_string).collect(),
        received: object.keys().cloned().collect(),
    })
}

fn object<'v>(key: &str, field: &str, value: &'v Value) -> Result<&'v Map<String, Value>, MarshalError> {
    let object = value.as_object().ok_or_else(|| {
        MarshalError::field(key, field, format!("expected an object, got {}", json_kind(value)))
    })?;
    Ok(object)
}

/// Checks an object carries exactly one field, `name`, and returns its value.
fn sole_field<'v>(
    key: &str,
    field: &str,
    value: &'v Value,
    name: &str,
) -> Result<&'v Value, MarshalError> {
    let object = object(key, field, value)?;
    if let Some(extra) = object.keys().find(|k| k.as_str() != name) {
        return Err(MarshalError::field(
            key,
            format!("{}.{}", field, extra),
            "unknown field",
        ));
    }
    object
        .get(name)
        .ok_or_else(|| MarshalError::field(key, format!("{}.{}", field, name), "missing field"))
}

fn text_input(key: &str, field: &str, value: &Value) -> Result<TextInput, MarshalError> {
    let text = sole_field(key, field, value, "text")?;
    Ok(TextInput {
        text: string(key, &format!("{}.text", field), text)?,
    })
}

fn path_field(key: &str, field: &str, value: &Value) -> Result<String, MarshalError> {
    let raw = sole_field(key, field, value, "path")?;
    let field = format!("{}.path", field);
    let path = string(key, &field, raw)?;
    if let Some(message) = path_syntax_errors(&path).into_iter().next() {
        return Err(MarshalError::field(key, field, message));
    }
    Ok(path)
}

fn batch<T>(
    key: &str,
    field: &str,
    value: &Value,
    name: &str,
    element: impl Fn(&str, &str, &Value) -> Result<T, MarshalError>,
) -> Result<Vec<T>, MarshalError> {
    let list_field = format!("{}.{}", field, name);
    let items = sole_field(key, field, value, name)?
        .as_array()
        .ok_or_else(|| MarshalError::field(key, &list_field, "expected a list"))?;
    if items.is_empty() {
        return Err(MarshalError::field(
            key,
            &list_field,
            "batch must contain at least one element",
        ));
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| element(key, &format!("{}[{}]", list_field, i), item))
        .collect()
}

fn string(key: &str, field: &str, value: &Value) -> Result<String, MarshalError> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        MarshalError::field(key, field, format!("expected a string, got {}", json_kind(value)))
    })
}

fn float(key: &str, field: &str, value: &Value) -> Result<f64, MarshalError> {
    value.as_f64().ok_or_else(|| {
        MarshalError::field(key, field, format!("expected a number, got {}", json_kind(value)))
    })
}

fn int(key: &str, field: &str, value: &Value) -> Result<i64, MarshalError> {
    let Value::Number(n) = value else {
        return Err(MarshalError::field(
            key,
            field,
            format!("expected an integer, got {}", json_kind(value)),
        ));
    };
    if let Some(v) = n.as_i64() {
        return Ok(v);
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
        .map(|f| f as i64)
        .ok_or_else(|| MarshalError::field(key, field, format!("expected an integer, got {}", n)))
}

fn is_whole_number(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_u64() || n.is_i64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}

fn number_of(value: &Value) -> Number {
    match value {
        Value::Number(n) => n.clone(),
        _ => Number::from(0),
    }
}

// Bounds of a validated schema are finite.
fn float_number(v: f64) -> Number {
    Number::from_f64(v).unwrap_or_else(|| Number::from(0))
}
