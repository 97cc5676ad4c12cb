//! Sample payloads and machine-readable payload shapes.
//!
//! Both are derived from a [`TaskSchema`] alone. A sample payload built from a
//! valid schema always decodes against that schema.

use serde_json::{json, Map, Value};

use crate::decode::{RequestBody, INPUTS_KEY, PARAMETERS_KEY};
use crate::input::{DirectoryInput, FileInput, Input, InputType, InputValues, TextInput};
use crate::parameter::{ParameterDescriptor, ParameterValue, ParameterValues};
use crate::schema::TaskSchema;

/// Sample for `text` inputs.
pub const SAMPLE_TEXT: &str = "A sample piece of text";
/// Sample for `file` inputs.
pub const SAMPLE_FILE: &str = "/Users/path/to/file";
/// Sample for `directory` inputs.
pub const SAMPLE_DIRECTORY: &str = "/Users/path/to/folder";
/// Sample for text parameters without a default.
pub const SAMPLE_PARAMETER_TEXT: &str = "Sample value for parameter";

const TEXT_AREA_SENTENCE: &str = "A sample piece of text of text that's long.";
const TEXT_AREA_REPEAT: usize = 8;

/// Builds a deterministic example request for `schema`.
pub fn sample_payload(schema: &TaskSchema) -> RequestBody {
    let inputs: InputValues = schema
        .inputs
        .iter()
        .map(|input| (input.key.clone(), sample_input(input.input_type)))
        .collect();
    let parameters: ParameterValues = schema
        .parameters
        .iter()
        .map(|param| (param.key.clone(), sample_parameter(&param.value)))
        .collect();
    RequestBody { inputs, parameters }
}

/// Returns the sample value for one input kind.
pub fn sample_input(input_type: InputType) -> Input {
    match input_type {
        InputType::Text => Input::Text(TextInput {
            text: SAMPLE_TEXT.to_string(),
        }),
        InputType::TextArea => Input::TextArea(TextInput {
            text: vec![TEXT_AREA_SENTENCE; TEXT_AREA_REPEAT].join(" "),
        }),
        InputType::File => Input::File(FileInput {
            path: SAMPLE_FILE.to_string(),
        }),
        InputType::Directory => Input::Directory(DirectoryInput {
            path: SAMPLE_DIRECTORY.to_string(),
        }),
        InputType::BatchText => Input::batch_text(numbered(SAMPLE_TEXT, " ")),
        InputType::BatchFile => Input::batch_file(numbered(SAMPLE_FILE, "")),
        InputType::BatchDirectory => Input::batch_directory(numbered(SAMPLE_DIRECTORY, "")),
    }
}

/// Returns the sample value for one parameter.
///
/// The declared default wins; otherwise ranged kinds use the lower bound and
/// enums their first key.
pub fn sample_parameter(descriptor: &ParameterDescriptor) -> ParameterValue {
    if let Some(default) = descriptor.default_value() {
        return default;
    }
    match descriptor {
        ParameterDescriptor::Text { .. } => ParameterValue::Text(SAMPLE_PARAMETER_TEXT.to_string()),
        ParameterDescriptor::Enum { enum_vals, .. } => ParameterValue::Enum(
            enum_vals
                .first()
                .map(|v| v.key.clone())
                .unwrap_or_default(),
        ),
        ParameterDescriptor::Float { .. } => ParameterValue::Float(1.0),
        ParameterDescriptor::RangedFloat { range, .. } => ParameterValue::RangedFloat(range.min),
        ParameterDescriptor::Int { .. } => ParameterValue::Int(1),
        ParameterDescriptor::RangedInt { range, .. } => ParameterValue::RangedInt(range.min),
    }
}

fn numbered(base: &str, separator: &str) -> [String; 2] {
    [format!("{base}{separator}1"), format!("{base}{separator}2")]
}

/// Describes the request body accepted for `schema` in JSON Schema terms.
pub fn payload_schema(schema: &TaskSchema) -> Value {
    let inputs = closed_object(
        schema
            .inputs
            .iter()
            .map(|input| (input.key.clone(), input_shape(input.input_type))),
    );
    let parameters = closed_object(
        schema
            .parameters
            .iter()
            .map(|param| (param.key.clone(), parameter_shape(&param.value))),
    );
    closed_object([
        (INPUTS_KEY.to_string(), inputs),
        (PARAMETERS_KEY.to_string(), parameters),
    ])
}

/// Shape of one input value.
pub fn input_shape(input_type: InputType) -> Value {
    let text = || closed_object([("text".to_string(), json!({"type": "string"}))]);
    let path = || {
        closed_object([(
            "path".to_string(),
            json!({"type": "string", "minLength": 1}),
        )])
    };
    let batch = |name: &str, item: Value| {
        closed_object([(
            name.to_string(),
            json!({"type": "array", "minItems": 1, "items": item}),
        )])
    };

    match input_type {
        InputType::Text | InputType::TextArea => text(),
        InputType::File | InputType::Directory => path(),
        InputType::BatchText => batch("texts", text()),
        InputType::BatchFile => batch("files", path()),
        InputType::BatchDirectory => batch("directories", path()),
    }
}

/// Shape of one parameter value.
pub fn parameter_shape(descriptor: &ParameterDescriptor) -> Value {
    let mut shape = match descriptor {
        ParameterDescriptor::Text { .. } => json!({"type": "string"}),
        ParameterDescriptor::Enum { .. } => json!({
            "type": "string",
            "enum": descriptor.enum_keys(),
        }),
        ParameterDescriptor::Float { .. } => json!({"type": "number"}),
        ParameterDescriptor::RangedFloat { range, .. } => json!({
            "type": "number",
            "minimum": range.min,
            "maximum": range.max,
        }),
        ParameterDescriptor::Int { .. } => json!({"type": "integer"}),
        ParameterDescriptor::RangedInt { range, .. } => json!({
            "type": "integer",
            "minimum": range.min,
            "maximum": range.max,
        }),
    };
    if let (Some(default), Some(object)) = (descriptor.default_value(), shape.as_object_mut()) {
        object.insert("default".to_string(), default.to_json());
    }
    shape
}

fn closed_object(properties: impl IntoIterator<Item = (String, Value)>) -> Value {
    let properties: Map<String, Value> = properties.into_iter().collect();
    let required: Vec<String> = properties.keys().cloned().collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}
