//! Shared endpoints used by the end-to-end tests.

use std::sync::Arc;

use mlserve_spec::{
    BatchFileResponse, EndpointDetails, EndpointRegistry, FileResponse, FileType, HandlerShape,
    InputSchema, InputType, InputValues, ParameterDescriptor, ParameterSchema, ParameterValues,
    ResponseBody, ScalarKind, TaskSchema, TextResponse,
};

/// Text input `t` plus a ranged float `p` in `[0, 1]`.
pub const SCORE_RULE: &str = "/score";
/// Batch file input whose outputs are titled with the input path.
pub const TITLES_RULE: &str = "/files/titles";
/// Endpoint registered without a task schema.
pub const INFERRED_RULE: &str = "/inferred";

pub fn score_schema() -> TaskSchema {
    TaskSchema::builder()
        .input(InputSchema::new("t", "Text", InputType::Text))
        .parameter(ParameterSchema::new(
            "p",
            "Threshold",
            ParameterDescriptor::ranged_float(0.0, 1.0, None),
        ))
        .build()
}

pub fn titles_schema() -> TaskSchema {
    TaskSchema::builder()
        .input(InputSchema::new("files", "Files", InputType::BatchFile))
        .parameter(ParameterSchema::new(
            "suffix",
            "Suffix",
            ParameterDescriptor::text(Some(".out")),
        ))
        .build()
}

fn score(inputs: &InputValues, params: &ParameterValues) -> anyhow::Result<ResponseBody> {
    let text = inputs.text("t").unwrap_or_default();
    let p = params.f64("p").unwrap_or_default();
    let label = if p >= 0.5 { "high" } else { "low" };
    Ok(TextResponse::new(format!("{} ({})", text, label))
        .with_title("score")
        .into())
}

fn titles(inputs: &InputValues, params: &ParameterValues) -> anyhow::Result<ResponseBody> {
    let files = inputs.batch_file("files").unwrap_or_default();
    let suffix = params.str("suffix").unwrap_or_default();
    Ok(ResponseBody::BatchFile(BatchFileResponse {
        files: files
            .iter()
            .map(|file| {
                FileResponse::new(FileType::Text, format!("{}{}", file.path, suffix))
                    .with_title(&file.path)
            })
            .collect(),
    }))
}

fn inferred(inputs: &InputValues, params: &ParameterValues) -> anyhow::Result<ResponseBody> {
    let text = inputs.text("text").unwrap_or_default();
    let count = params.i64("count").unwrap_or_default();
    Ok(TextResponse::new(format!("{}x{}", text, count)).into())
}

/// Registry with the three fixture endpoints, in the order of the rule
/// constants.
pub fn fixture_registry() -> Arc<EndpointRegistry> {
    let mut registry = EndpointRegistry::new();
    registry
        .register(EndpointDetails::new(SCORE_RULE, score_schema(), score).short_title("Score"))
        .expect("score endpoint registers");
    registry
        .register(EndpointDetails::new(TITLES_RULE, titles_schema(), titles))
        .expect("titles endpoint registers");
    registry
        .register(EndpointDetails::from_shape(
            INFERRED_RULE,
            HandlerShape::new()
                .input("text", InputType::Text)
                .parameter("count", ScalarKind::Int),
            inferred,
        ))
        .expect("inferred endpoint registers");
    Arc::new(registry)
}
