//! Demo endpoints served by the `mlserve-demo` binary.

use anyhow::Context;
use mlserve_spec::templates::{batch_text_response, batch_text_schema, TEXT_INPUTS_KEY};
use mlserve_spec::{
    AppMetadata, BatchFileResponse, DirectoryResponse, EndpointDetails, EndpointRegistry, EnumVal,
    FileResponse, FileType, HandlerShape, InputSchema, InputType, InputValues, MarshalError,
    ParameterDescriptor, ParameterSchema, ParameterValues, ResponseBody, ScalarKind, TaskSchema,
    TextResponse,
};

const APP_INFO: &str = "# mlserve demo

Sample endpoints showing every input kind, served over HTTP with
`mlserve-demo serve` or run directly as subcommands.
";

/// Builds the registry with every demo endpoint.
pub fn demo_registry() -> Result<EndpointRegistry, MarshalError> {
    let mut registry = EndpointRegistry::new();

    registry.register(
        EndpointDetails::new("/transform_case", transform_case_schema(), transform_case)
            .short_title("Transform Case")
            .order(0),
    )?;
    registry.register(
        EndpointDetails::new("/count_words", count_words_schema(), count_words)
            .short_title("Count Words")
            .order(1),
    )?;
    registry.register(
        EndpointDetails::new("/files/echo", echo_files_schema(), echo_files)
            .short_title("Echo Files")
            .order(2),
    )?;
    registry.register(
        EndpointDetails::new("/directory/echo", echo_directory_schema(), echo_directory)
            .short_title("Echo Directory")
            .order(3),
    )?;
    registry.register(EndpointDetails::from_shape(
        "/shout",
        HandlerShape::new()
            .input("text", InputType::Text)
            .parameter("times", ScalarKind::Int),
        shout,
    ))?;

    registry.set_app_metadata(AppMetadata::new(
        "mlserve demo",
        "mlserve contributors",
        env!("CARGO_PKG_VERSION"),
        APP_INFO,
    ));

    Ok(registry)
}

fn transform_case_schema() -> TaskSchema {
    batch_text_schema(vec![ParameterSchema::new(
        "to_case",
        "Case to convert to",
        ParameterDescriptor::enumeration(
            vec![
                EnumVal::new("upper", "UPPER"),
                EnumVal::new("lower", "lower"),
            ],
            Some("upper"),
        ),
    )])
}

fn transform_case(inputs: &InputValues, params: &ParameterValues) -> anyhow::Result<ResponseBody> {
    let texts = inputs
        .batch_text(TEXT_INPUTS_KEY)
        .context("text inputs missing")?;
    let upper = params.str("to_case") != Some("lower");

    Ok(batch_text_response(texts.iter().map(|input| {
        let converted = if upper {
            input.text.to_uppercase()
        } else {
            input.text.to_lowercase()
        };
        (input.text.clone(), converted)
    })))
}

fn count_words_schema() -> TaskSchema {
    TaskSchema::builder()
        .input(InputSchema::new("text", "Text to analyse", InputType::TextArea))
        .parameter(
            ParameterSchema::new(
                "min_length",
                "Minimum word length",
                ParameterDescriptor::ranged_int(1, 32, Some(1)),
            )
            .with_subtitle("Shorter words are not counted"),
        )
        .build()
}

fn count_words(inputs: &InputValues, params: &ParameterValues) -> anyhow::Result<ResponseBody> {
    let text = inputs.text("text").context("text input missing")?;
    let min_length = usize::try_from(params.i64("min_length").unwrap_or(1))?;
    let count = text
        .split_whitespace()
        .filter(|word| word.chars().count() >= min_length)
        .count();

    Ok(TextResponse::new(count.to_string())
        .with_title("Word count")
        .into())
}

fn echo_files_schema() -> TaskSchema {
    TaskSchema::builder()
        .input(InputSchema::new("files", "Files to echo", InputType::BatchFile))
        .parameter(ParameterSchema::new(
            "confidence",
            "Reported confidence",
            ParameterDescriptor::ranged_float(0.0, 1.0, Some(0.5)),
        ))
        .build()
}

fn echo_files(inputs: &InputValues, params: &ParameterValues) -> anyhow::Result<ResponseBody> {
    let files = inputs.batch_file("files").context("files input missing")?;
    let confidence = params.f64("confidence").unwrap_or_default();

    Ok(ResponseBody::BatchFile(BatchFileResponse {
        files: files
            .iter()
            .map(|file| {
                FileResponse::new(FileType::Text, &file.path)
                    .with_title(&file.path)
                    .with_subtitle(format!("confidence {}", confidence))
            })
            .collect(),
    }))
}

fn echo_directory_schema() -> TaskSchema {
    TaskSchema::builder()
        .input(InputSchema::new("dir", "Directory to echo", InputType::Directory))
        .parameter(ParameterSchema::new(
            "depth",
            "Depth",
            ParameterDescriptor::ranged_int(0, 8, Some(1)),
        ))
        .build()
}

fn echo_directory(inputs: &InputValues, params: &ParameterValues) -> anyhow::Result<ResponseBody> {
    let dir = inputs.directory("dir").context("dir input missing")?;
    let depth = params.i64("depth").unwrap_or_default();

    Ok(DirectoryResponse::new(&dir.path)
        .with_title(format!("depth {}", depth))
        .into())
}

fn shout(inputs: &InputValues, params: &ParameterValues) -> anyhow::Result<ResponseBody> {
    let text = inputs.text("text").context("text input missing")?;
    let times = usize::try_from(params.i64("times").unwrap_or(1)).unwrap_or(0);
    Ok(TextResponse::new(text.to_uppercase().repeat(times)).into())
}
