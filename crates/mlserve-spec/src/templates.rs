//! Ready-made schemas and responses for common endpoint shapes.

use crate::input::InputType;
use crate::output::{BatchTextResponse, ResponseBody, TextResponse};
use crate::parameter::ParameterDescriptor;
use crate::schema::{InputSchema, ParameterSchema, TaskSchema};

/// Input key used by [`batch_text_schema`].
pub const TEXT_INPUTS_KEY: &str = "text_inputs";
/// Input key used by [`batch_file_schema`].
pub const FILE_INPUTS_KEY: &str = "file_inputs";

/// Schema with a single batch-of-texts input and the given parameters.
pub fn batch_text_schema(parameters: Vec<ParameterSchema>) -> TaskSchema {
    TaskSchema::builder()
        .input(InputSchema::new(
            TEXT_INPUTS_KEY,
            "Provide text inputs",
            InputType::BatchText,
        ))
        .parameters(parameters)
        .build()
}

/// Schema with a single batch-of-files input and the given parameters.
pub fn batch_file_schema(parameters: Vec<ParameterSchema>) -> TaskSchema {
    TaskSchema::builder()
        .input(InputSchema::new(
            FILE_INPUTS_KEY,
            "Provide file inputs",
            InputType::BatchFile,
        ))
        .parameters(parameters)
        .build()
}

/// A parameter default used to infer a parameter schema.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::Text(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::Text(value)
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        DefaultValue::Int(value)
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        DefaultValue::Float(value)
    }
}

impl DefaultValue {
    fn descriptor(self) -> ParameterDescriptor {
        match self {
            DefaultValue::Text(v) => ParameterDescriptor::Text { default: Some(v) },
            DefaultValue::Int(v) => ParameterDescriptor::int(Some(v)),
            DefaultValue::Float(v) => ParameterDescriptor::float(Some(v)),
        }
    }
}

/// Builds one unconstrained parameter per `(key, default)` pair.
///
/// The label repeats the key and the kind follows the default's type.
pub fn parameter_schemas_from_defaults<I, K, V>(defaults: I) -> Vec<ParameterSchema>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<DefaultValue>,
{
    defaults
        .into_iter()
        .map(|(key, default)| {
            let key = key.into();
            ParameterSchema::new(key.clone(), key, default.into().descriptor())
        })
        .collect()
}

/// Builds a batch-of-texts response from `(title, value)` predictions.
pub fn batch_text_response<I, K, V>(predictions: I) -> ResponseBody
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    ResponseBody::BatchText(BatchTextResponse {
        texts: predictions
            .into_iter()
            .map(|(title, value)| TextResponse::new(value).with_title(title))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_batch_text_schema() {
        let schema = batch_text_schema(vec![]);
        assert_eq!(schema.inputs.len(), 1);
        assert_eq!(schema.inputs[0].key, "text_inputs");
        assert_eq!(schema.inputs[0].input_type, InputType::BatchText);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_parameter_schemas_from_defaults() {
        let params = parameter_schemas_from_defaults([
            ("threshold", DefaultValue::from(0.5)),
            ("top_k", DefaultValue::from(3i64)),
            ("model", DefaultValue::from("small")),
        ]);
        let schema = batch_file_schema(params);

        assert_eq!(
            serde_json::to_value(&schema.parameters).unwrap(),
            json!([
                {"key": "threshold", "label": "threshold", "value": {"parameter_type": "float", "default": 0.5}},
                {"key": "top_k", "label": "top_k", "value": {"parameter_type": "int", "default": 3}},
                {"key": "model", "label": "model", "value": {"parameter_type": "text", "default": "small"}}
            ])
        );
    }

    #[test]
    fn test_batch_text_response() {
        let body = batch_text_response([("a.txt", "positive"), ("b.txt", "negative")]);
        assert_eq!(
            body.encode()["texts"][1],
            json!({"output_type": "text", "value": "negative", "title": "b.txt", "subtitle": null})
        );
    }
}
